//! Error types.
//!
//! Only [`Error::NoTty`] is fatal to a running application; everything else is
//! either recovered locally (render panics, state restore) or surfaced to the
//! caller of an explicit operation (session save/load).

use std::path::PathBuf;

/// Errors produced by retui.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The terminal driver could not start because stdout is not a TTY.
    #[error("stdout is not a terminal")]
    NoTty,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("layout failed: {0}")]
    Layout(String),

    /// Reading or writing a session file failed.
    #[error("session file {path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component rejected persisted state.
    #[error("cannot restore state for `{id}`: {reason}")]
    StateRestore { id: String, reason: String },

    #[error("invalid session data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<taffy::TaffyError> for Error {
    fn from(err: taffy::TaffyError) -> Self {
        Self::Layout(err.to_string())
    }
}
