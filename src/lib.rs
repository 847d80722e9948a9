//! # retui
//!
//! Reactive terminal UI runtime.
//!
//! Applications describe their interface as a fresh [`Element`] tree on every
//! render. The runtime makes that always-rebuilt tree behave like a
//! long-lived object graph:
//!
//! - the [`Reconciler`] maps each component occurrence back onto the single
//!   live instance for its type and structural path, so widget state survives
//!   rebuilds
//! - the [`FocusManager`] keeps one logical focus position across a
//!   focusable set recomputed every frame
//! - the [`EventRouter`] sends each key through an ordered chain of handlers
//!   until exactly one consumes it
//! - the [`DiffRenderer`] turns two frame buffers into minimal terminal output
//!
//! ## Pipeline
//!
//! ```text
//! render fn → Element tree → reconcile → focus → layout (taffy) → paint → diff → terminal
//! ```
//!
//! ## Modules
//!
//! - [`element`] - Element tree and structural paths
//! - [`component`] - Component trait and optional capabilities
//! - [`reconcile`] - Component identity cache
//! - [`state`] - Focus, keyboard, key bindings, scroll, routing
//! - [`style`], [`layout`], [`paint`] - From tree to cells
//! - [`renderer`] - Frame buffers and differential output
//! - [`terminal`] - Terminal driver trait, crossterm driver and a mock
//! - [`session`] - Persisting component state across restarts
//! - [`widgets`] - Reference components
//! - [`runtime`] - The render and input loop

pub mod component;
pub mod context;
pub mod element;
pub mod error;
pub mod layout;
pub mod paint;
pub mod reconcile;
pub mod renderer;
pub mod runtime;
pub mod session;
pub mod state;
pub mod style;
pub mod terminal;
pub mod types;
pub mod widgets;

// Re-export commonly used items
pub use types::*;

pub use component::{
    Component, ComponentRef, Focusable, KeyHandler, Modal, PropsUpdater, Stateful,
};
pub use context::{AppContext, Callback, RenderRequester};
pub use element::{Element, ElementKind, Styles};
pub use error::{Error, Result};
pub use layout::{LayoutBox, ScrollRegion, compute_layout, find_scroll_region};
pub use reconcile::{CacheKey, CachePolicy, ComponentCache, Reconciler};
pub use renderer::{DiffRenderer, FrameBuffer};
pub use runtime::{Runtime, RuntimeConfig};
pub use session::{SessionSnapshot, StateMap};
pub use state::{
    EventRouter, FocusManager, KeyBindings, KeyCode, KeyEvent, KeyState, Modifier,
    RouteOutcome, ScrollManager, Trigger,
};
pub use terminal::{CrosstermTerminal, InputEvent, MockTerminal, Terminal};
