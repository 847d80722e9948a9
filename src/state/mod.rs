//! State Module - interaction state
//!
//! - **Focus** - focusable collection, stable focus across rebuilds, Tab cycling
//! - **Keyboard** - key event types and byte mapping
//! - **Global keys** - the injected key binding registry
//! - **Scroll** - per-region scroll offsets with clamping and sticky tail
//! - **Router** - the ordered key routing chain

pub mod focus;
pub mod global_keys;
pub mod keyboard;
pub mod router;
pub mod scroll;

pub use focus::{FocusEntry, FocusManager};
pub use global_keys::{BindingId, KeyBindings, Trigger};
pub use keyboard::{KeyCode, KeyEvent, KeyState, Modifier};
pub use router::{EventRouter, Layer, RouteOutcome, RouteTarget};
pub use scroll::{ScrollManager, ScrollState};
