//! Reference widgets.
//!
//! Each one exercises a different capability combination:
//!
//! - [`TextInput`]: focusable, persists its value, refreshes props across renders
//! - [`TabBar`]: not focusable, but sees Alt+1..9 wherever focus is
//! - [`Dialog`]: a modal closed by Escape

mod dialog;
mod tab_bar;
mod text_input;

pub use dialog::Dialog;
pub use tab_bar::TabBar;
pub use text_input::TextInput;
