//! Renderer: frame buffers, escape sequences and the differential writer.

pub mod ansi;
pub mod buffer;
pub mod diff;
pub mod output;

pub use buffer::FrameBuffer;
pub use diff::{DiffRenderer, DirtyRun, FrameStats, dirty_runs};
pub use output::{OutputBuffer, StatefulCellRenderer};
