//! Components and their optional capabilities.
//!
//! A [`Component`] renders itself into an [`Element`] subtree. Optional
//! behaviors are opted into by overriding the matching accessor
//! (`focusable`, `stateful`, ...) to return `Some(self)`. Callers never probe
//! concrete types; they ask the component for a capability and get a trait
//! object or `None`.
//!
//! # Example
//!
//! ```
//! use retui::component::{Component, Focusable};
//! use retui::context::AppContext;
//! use retui::element::Element;
//! use retui::state::keyboard::KeyEvent;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: u32,
//!     focused: bool,
//! }
//!
//! impl Component for Counter {
//!     fn render(&self) -> Element {
//!         Element::text(format!("count: {}", self.count))
//!     }
//!
//!     fn focusable(&mut self) -> Option<&mut dyn Focusable> {
//!         Some(self)
//!     }
//! }
//!
//! impl Focusable for Counter {
//!     fn handle_key(&mut self, event: &KeyEvent, _ctx: &AppContext) -> bool {
//!         if event.is_char('+') {
//!             self.count += 1;
//!             return true;
//!         }
//!         false
//!     }
//!
//!     fn set_focused(&mut self, focused: bool) {
//!         self.focused = focused;
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::context::AppContext;
use crate::element::Element;
use crate::error::Result;
use crate::session::StateMap;
use crate::state::keyboard::KeyEvent;

/// Shared handle to a live component instance.
pub type ComponentRef = Rc<RefCell<dyn Component>>;

// =============================================================================
// AS ANY
// =============================================================================

/// Downcasting support, implemented for every `'static` type.
///
/// Call these through `&dyn Component`, never through a smart pointer.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// =============================================================================
// COMPONENT
// =============================================================================

/// An application-defined object that renders itself into an Element subtree.
pub trait Component: AsAny {
    /// Produce this component's current output.
    fn render(&self) -> Element;

    fn focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    fn stateful(&mut self) -> Option<&mut dyn Stateful> {
        None
    }

    fn props_updater(&mut self) -> Option<&mut dyn PropsUpdater> {
        None
    }

    fn modal(&mut self) -> Option<&mut dyn Modal> {
        None
    }

    /// Tree-wide key handler for components that are not focusable
    /// themselves but need keys regardless of focus (tab bars, menus).
    fn key_handler(&mut self) -> Option<&mut dyn KeyHandler> {
        None
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Eligible to receive keyboard focus.
pub trait Focusable {
    /// Handle a key while focused. Return true if handled; false lets the
    /// event continue down the routing chain.
    fn handle_key(&mut self, event: &KeyEvent, ctx: &AppContext) -> bool;

    /// Checked every frame, so disabled widgets drop out of the tab order.
    fn is_focusable(&self) -> bool {
        true
    }

    /// Hardware cursor position relative to the component's box.
    fn cursor_offset(&self) -> Option<(u16, u16)> {
        None
    }

    fn set_focused(&mut self, focused: bool);
}

/// Persists state across process restarts.
pub trait Stateful {
    /// Stable identity, also used to keep focus across rebuilds.
    fn id(&self) -> String;

    fn save_state(&self) -> StateMap;

    /// Restore from a snapshot. Fields that are missing or of the wrong type
    /// should be skipped, leaving their defaults in place.
    fn load_state(&mut self, state: &StateMap) -> Result<()>;
}

/// Refreshes transient configuration from a freshly constructed instance.
pub trait PropsUpdater {
    /// Copy callbacks, labels and similar props from `fresh` (an instance of
    /// the same concrete type) while keeping internal state.
    fn update_props(&mut self, fresh: &dyn Component);
}

/// An overlay that can be dismissed with Escape.
pub trait Modal {
    fn is_open(&self) -> bool;

    fn should_close_on_escape(&self) -> bool {
        true
    }

    fn close(&mut self);
}

/// Receives keys through the tree-wide handler layer.
pub trait KeyHandler {
    fn handle_global_key(&mut self, event: &KeyEvent, ctx: &AppContext) -> bool;
}

// =============================================================================
// HELPERS
// =============================================================================

/// Concrete type of the instance behind a handle.
pub fn type_id_of(component: &ComponentRef) -> TypeId {
    let guard = component.borrow();
    let c: &dyn Component = &*guard;
    c.as_any().type_id()
}

/// Readable type name of the instance behind a handle.
pub fn type_name_of(component: &ComponentRef) -> &'static str {
    match component.try_borrow() {
        Ok(guard) => {
            let c: &dyn Component = &*guard;
            c.type_name()
        }
        Err(_) => "<borrowed>",
    }
}

/// Downcast a component to its concrete type.
pub fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

/// Render a component inside a recovered call boundary.
///
/// A panic in `render` becomes an error placeholder for this subtree only.
pub fn render_isolated(component: &ComponentRef) -> Element {
    let Ok(guard) = component.try_borrow() else {
        tracing::warn!("component is mutably borrowed during render");
        return Element::error("component busy");
    };
    let c: &dyn Component = &*guard;
    match panic::catch_unwind(AssertUnwindSafe(|| c.render())) {
        Ok(element) => element,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let name = short_type_name(c.type_name());
            tracing::warn!(component = name, %reason, "render panicked");
            Element::error(format!("{name} failed to render"))
        }
    }
}

/// `my_app::widgets::Input<T>` -> `Input<T>`
pub(crate) fn short_type_name(full: &str) -> &str {
    let generic_start = full.find('<').unwrap_or(full.len());
    match full[..generic_start].rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label(&'static str);

    impl Component for Label {
        fn render(&self) -> Element {
            Element::text(self.0)
        }
    }

    struct Exploding;

    impl Component for Exploding {
        fn render(&self) -> Element {
            panic!("kaboom")
        }
    }

    #[test]
    fn test_type_identity() {
        let a: ComponentRef = Rc::new(RefCell::new(Label("a")));
        let b: ComponentRef = Rc::new(RefCell::new(Label("b")));
        let c: ComponentRef = Rc::new(RefCell::new(Exploding));
        assert_eq!(type_id_of(&a), type_id_of(&b));
        assert_ne!(type_id_of(&a), type_id_of(&c));
        assert_eq!(type_id_of(&a), TypeId::of::<Label>());
    }

    #[test]
    fn test_default_capabilities_are_absent() {
        let mut label = Label("x");
        assert!(label.focusable().is_none());
        assert!(label.stateful().is_none());
        assert!(label.props_updater().is_none());
        assert!(label.modal().is_none());
        assert!(label.key_handler().is_none());
    }

    #[test]
    fn test_render_isolated_recovers_panics() {
        let bad: ComponentRef = Rc::new(RefCell::new(Exploding));
        let el = render_isolated(&bad);
        assert_eq!(el.text_content(), Some("⚠ Exploding failed to render"));

        // The instance stays usable afterwards
        assert!(bad.try_borrow_mut().is_ok());
    }

    #[test]
    fn test_render_isolated_passes_output_through() {
        let ok: ComponentRef = Rc::new(RefCell::new(Label("fine")));
        assert_eq!(render_isolated(&ok).text_content(), Some("fine"));
    }

    #[test]
    fn test_downcast() {
        let label = Label("x");
        let c: &dyn Component = &label;
        assert_eq!(downcast_ref::<Label>(c).map(|l| l.0), Some("x"));
        assert!(downcast_ref::<Exploding>(c).is_none());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Input"), "Input");
        assert_eq!(short_type_name("a::Wrapper<a::b::C>"), "Wrapper<a::b::C>");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
