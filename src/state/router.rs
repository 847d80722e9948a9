//! Event Router - one consumer per keystroke.
//!
//! Layers, first match wins:
//!
//! 1. exit shortcuts (Ctrl+C, Ctrl+D) stop the app
//! 2. Escape closes the first open modal that allows it
//! 3. global key bindings
//! 4. Tab / Shift+Tab cycle focus
//! 5. arrows and paging scroll the active scroll region, but only consume the
//!    key if the offset actually moved
//! 6. the focused component's `handle_key`
//! 7. non-focusable components exposing a tree-wide key handler
//!
//! Anything left over is dropped. A render is requested whenever layers 2-7
//! consume a key.

use super::focus::FocusManager;
use super::global_keys::KeyBindings;
use super::keyboard::{KeyCode, KeyEvent, KeyState, Modifier};
use super::scroll::{LINE_SCROLL, ScrollManager};
use crate::component::ComponentRef;
use crate::context::AppContext;
use crate::element::Element;

/// Which layer consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    ModalEscape,
    Binding,
    FocusCycle,
    Scroll,
    Focused,
    TreeHandler,
}

/// Result of routing one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// An exit shortcut; the app should shut down.
    Exit,
    Consumed(Layer),
    Dropped,
}

/// Everything the router reads or mutates for one key.
pub struct RouteTarget<'a> {
    pub tree: &'a Element,
    pub focus: &'a mut FocusManager,
    pub scroll: &'a mut ScrollManager,
    /// Element id of the scroll region detected by the last layout pass.
    pub scroll_region: Option<&'a str>,
}

#[derive(Debug)]
pub struct EventRouter {
    bindings: KeyBindings,
    exit_on_ctrl_d: bool,
}

impl EventRouter {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            exit_on_ctrl_d: true,
        }
    }

    pub fn with_exit_on_ctrl_d(mut self, enabled: bool) -> Self {
        self.exit_on_ctrl_d = enabled;
        self
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// Route one key through the layers.
    pub fn route(
        &mut self,
        event: &KeyEvent,
        target: RouteTarget<'_>,
        ctx: &AppContext,
    ) -> RouteOutcome {
        if event.state == KeyState::Release {
            return RouteOutcome::Dropped;
        }

        if self.is_exit(event) {
            tracing::info!("exit shortcut");
            ctx.quit();
            return RouteOutcome::Exit;
        }

        let outcome = self.dispatch(event, target, ctx);
        match outcome {
            RouteOutcome::Consumed(layer) => {
                tracing::debug!(?layer, key = ?event.code, "key consumed");
                ctx.request_render();
            }
            RouteOutcome::Dropped => tracing::trace!(key = ?event.code, "key dropped"),
            RouteOutcome::Exit => {}
        }
        outcome
    }

    fn is_exit(&self, event: &KeyEvent) -> bool {
        event.is_ctrl('c') || (self.exit_on_ctrl_d && event.is_ctrl('d'))
    }

    fn dispatch(&mut self, event: &KeyEvent, target: RouteTarget<'_>, ctx: &AppContext) -> RouteOutcome {
        let RouteTarget {
            tree,
            focus,
            scroll,
            scroll_region,
        } = target;

        if event.code == KeyCode::Escape && close_open_modal(tree) {
            return RouteOutcome::Consumed(Layer::ModalEscape);
        }

        if self.bindings.dispatch(event, ctx) {
            return RouteOutcome::Consumed(Layer::Binding);
        }

        if event.code == KeyCode::Tab {
            let mods = event.modifiers;
            if mods == Modifier::NONE {
                focus.next();
                return RouteOutcome::Consumed(Layer::FocusCycle);
            }
            if mods == Modifier::SHIFT {
                focus.previous();
                return RouteOutcome::Consumed(Layer::FocusCycle);
            }
        }

        if let Some(region) = scroll_region {
            if scroll_key(scroll, region, event) {
                return RouteOutcome::Consumed(Layer::Scroll);
            }
        }

        if let Some(focused) = focus.focused_component() {
            if deliver_to_focused(&focused, event, ctx) {
                return RouteOutcome::Consumed(Layer::Focused);
            }
        }

        if deliver_to_tree_handlers(tree, event, ctx) {
            return RouteOutcome::Consumed(Layer::TreeHandler);
        }

        RouteOutcome::Dropped
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(KeyBindings::new())
    }
}

// =============================================================================
// LAYERS
// =============================================================================

/// Wrapper components in pre-order.
fn components(tree: &Element) -> Vec<ComponentRef> {
    let mut out = Vec::new();
    tree.walk(&mut |node, _| {
        if let Some(c) = &node.component {
            out.push(c.clone());
        }
    });
    out
}

fn close_open_modal(tree: &Element) -> bool {
    for component in components(tree) {
        let Ok(mut guard) = component.try_borrow_mut() else {
            continue;
        };
        if let Some(modal) = guard.modal() {
            if modal.is_open() && modal.should_close_on_escape() {
                modal.close();
                return true;
            }
        }
    }
    false
}

/// Apply a scroll key to `region`. True only if the offset moved.
fn scroll_key(scroll: &mut ScrollManager, region: &str, event: &KeyEvent) -> bool {
    let line = LINE_SCROLL as i32;
    match (&event.code, event.modifiers) {
        (KeyCode::Up, Modifier::NONE) => scroll.scroll_by(region, 0, -line),
        (KeyCode::Down, Modifier::NONE) => scroll.scroll_by(region, 0, line),
        (KeyCode::Left, Modifier::NONE) => scroll.scroll_by(region, -line, 0),
        (KeyCode::Right, Modifier::NONE) => scroll.scroll_by(region, line, 0),
        (KeyCode::PageUp, Modifier::NONE) => scroll.page_up(region),
        (KeyCode::PageDown, Modifier::NONE) => scroll.page_down(region),
        (KeyCode::Home, Modifier::CTRL) => scroll.scroll_to_top(region),
        (KeyCode::End, Modifier::CTRL) => scroll.scroll_to_bottom(region),
        _ => false,
    }
}

fn deliver_to_focused(focused: &ComponentRef, event: &KeyEvent, ctx: &AppContext) -> bool {
    let Ok(mut guard) = focused.try_borrow_mut() else {
        tracing::warn!("focused component busy, key not delivered");
        return false;
    };
    guard
        .focusable()
        .is_some_and(|f| f.handle_key(event, ctx))
}

fn deliver_to_tree_handlers(tree: &Element, event: &KeyEvent, ctx: &AppContext) -> bool {
    for component in components(tree) {
        let Ok(mut guard) = component.try_borrow_mut() else {
            continue;
        };
        if guard.focusable().is_some() {
            continue;
        }
        if let Some(handler) = guard.key_handler() {
            if handler.handle_global_key(event, ctx) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Focusable, KeyHandler, Modal};
    use crate::reconcile::Reconciler;
    use crate::state::global_keys::Trigger;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Input {
        value: String,
        bubble_enter: bool,
    }

    impl Component for Input {
        fn render(&self) -> Element {
            Element::text(self.value.clone())
        }

        fn focusable(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }
    }

    impl Focusable for Input {
        fn handle_key(&mut self, event: &KeyEvent, _: &AppContext) -> bool {
            if event.code == KeyCode::Enter {
                return !self.bubble_enter;
            }
            match event.printable() {
                Some(c) => {
                    self.value.push(c);
                    true
                }
                None => false,
            }
        }

        fn set_focused(&mut self, _: bool) {}
    }

    struct Tabs {
        hits: Rc<RefCell<Vec<char>>>,
    }

    impl Component for Tabs {
        fn render(&self) -> Element {
            Element::text("tabs")
        }

        fn key_handler(&mut self) -> Option<&mut dyn KeyHandler> {
            Some(self)
        }
    }

    impl KeyHandler for Tabs {
        fn handle_global_key(&mut self, event: &KeyEvent, _: &AppContext) -> bool {
            match (&event.code, event.modifiers) {
                (KeyCode::Char(c), Modifier::ALT) if c.is_ascii_digit() => {
                    self.hits.borrow_mut().push(*c);
                    true
                }
                (KeyCode::Enter, _) => {
                    self.hits.borrow_mut().push('\n');
                    true
                }
                _ => false,
            }
        }
    }

    struct Popup {
        open: bool,
    }

    impl Component for Popup {
        fn render(&self) -> Element {
            Element::text(if self.open { "popup" } else { "" })
        }

        fn modal(&mut self) -> Option<&mut dyn Modal> {
            Some(self)
        }
    }

    impl Modal for Popup {
        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            self.open = false;
        }
    }

    struct Harness {
        tree: Element,
        focus: FocusManager,
        scroll: ScrollManager,
        region: Option<String>,
        router: EventRouter,
        ctx: AppContext,
        hits: Rc<RefCell<Vec<char>>>,
    }

    impl Harness {
        fn new(tree: Element, bindings: KeyBindings) -> Self {
            let mut tree = tree;
            let mut focus = FocusManager::new();
            focus.rebuild(&mut tree, &mut Reconciler::default());
            Self {
                tree,
                focus,
                scroll: ScrollManager::new(),
                region: None,
                router: EventRouter::new(bindings),
                ctx: AppContext::new(),
                hits: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn press(&mut self, event: KeyEvent) -> RouteOutcome {
            let target = RouteTarget {
                tree: &self.tree,
                focus: &mut self.focus,
                scroll: &mut self.scroll,
                scroll_region: self.region.as_deref(),
            };
            self.router.route(&event, target, &self.ctx)
        }

        fn input_value(&self, path: &str) -> String {
            let c = self.tree.component_at(path).expect("input");
            let guard = c.borrow();
            crate::component::downcast_ref::<Input>(&*guard)
                .map(|i| i.value.clone())
                .unwrap_or_default()
        }
    }

    fn input_tree() -> Element {
        Element::container().child(Element::component(Input::default()))
    }

    #[test]
    fn test_exit_shortcuts() {
        let mut h = Harness::new(input_tree(), KeyBindings::new());
        assert_eq!(h.press(KeyEvent::ctrl('c')), RouteOutcome::Exit);
        assert!(!h.ctx.is_running());
    }

    #[test]
    fn test_ctrl_d_can_be_disabled() {
        let mut h = Harness::new(input_tree(), KeyBindings::new());
        h.router = EventRouter::default().with_exit_on_ctrl_d(false);
        assert_eq!(h.press(KeyEvent::ctrl('d')), RouteOutcome::Dropped);
        assert!(h.ctx.is_running());
    }

    #[test]
    fn test_binding_beats_focused_input() {
        let fired = Rc::new(RefCell::new(0));
        let f = fired.clone();
        let mut bindings = KeyBindings::new();
        bindings.on(Trigger::Byte(15), move |_, _| {
            *f.borrow_mut() += 1;
            true
        });
        let mut h = Harness::new(input_tree(), bindings);

        assert_eq!(h.press(KeyEvent::from_byte(15)), RouteOutcome::Consumed(Layer::Binding));
        assert_eq!(*fired.borrow(), 1);

        assert_eq!(h.press(KeyEvent::char('a')), RouteOutcome::Consumed(Layer::Focused));
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(h.input_value("0"), "a");
    }

    #[test]
    fn test_tab_cycles_focus() {
        let tree = Element::container()
            .child(Element::component(Input::default()))
            .child(Element::component(Input::default()));
        let mut h = Harness::new(tree, KeyBindings::new());
        assert_eq!(h.press(KeyEvent::new(KeyCode::Tab)), RouteOutcome::Consumed(Layer::FocusCycle));
        assert_eq!(h.focus.focus_index(), Some(1));
        h.press(KeyEvent::with_modifiers(KeyCode::Tab, Modifier::SHIFT));
        assert_eq!(h.focus.focus_index(), Some(0));
    }

    #[test]
    fn test_scroll_only_consumes_when_moved() {
        let mut h = Harness::new(Element::container(), KeyBindings::new());
        h.scroll.update_dimensions("log", 10, 10, 10, 5);
        h.region = Some("log".into());

        assert_eq!(h.press(KeyEvent::new(KeyCode::Up)), RouteOutcome::Dropped);
        assert_eq!(h.press(KeyEvent::new(KeyCode::Down)), RouteOutcome::Consumed(Layer::Scroll));
        assert_eq!(h.scroll.offset("log"), (0, 1));
    }

    #[test]
    fn test_scroll_boundary_falls_through_to_focused() {
        struct ArrowSink(bool);
        impl Component for ArrowSink {
            fn render(&self) -> Element {
                Element::text("")
            }
            fn focusable(&mut self) -> Option<&mut dyn Focusable> {
                Some(self)
            }
        }
        impl Focusable for ArrowSink {
            fn handle_key(&mut self, event: &KeyEvent, _: &AppContext) -> bool {
                self.0 = event.code == KeyCode::Up;
                self.0
            }
            fn set_focused(&mut self, _: bool) {}
        }

        let mut h = Harness::new(Element::component(ArrowSink(false)), KeyBindings::new());
        h.scroll.update_dimensions("log", 10, 10, 10, 5);
        h.region = Some("log".into());
        assert_eq!(h.press(KeyEvent::new(KeyCode::Up)), RouteOutcome::Consumed(Layer::Focused));
    }

    #[test]
    fn test_enter_bubbles_to_tree_handler() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let tree = Element::container()
            .child(Element::component(Tabs { hits: hits.clone() }))
            .child(Element::component(Input {
                value: String::new(),
                bubble_enter: true,
            }));
        let mut h = Harness::new(tree, KeyBindings::new());
        h.hits = hits.clone();

        assert_eq!(
            h.press(KeyEvent::new(KeyCode::Enter)),
            RouteOutcome::Consumed(Layer::TreeHandler)
        );
        assert_eq!(
            h.press(KeyEvent::alt('2')),
            RouteOutcome::Consumed(Layer::TreeHandler)
        );
        assert_eq!(*h.hits.borrow(), vec!['\n', '2']);
    }

    #[test]
    fn test_escape_closes_modal_first() {
        let tree = Element::container()
            .child(Element::component(Popup { open: true }))
            .child(Element::component(Input::default()));
        let mut h = Harness::new(tree, KeyBindings::new());
        assert_eq!(
            h.press(KeyEvent::new(KeyCode::Escape)),
            RouteOutcome::Consumed(Layer::ModalEscape)
        );
        // Nothing open any more
        assert_eq!(h.press(KeyEvent::new(KeyCode::Escape)), RouteOutcome::Dropped);
    }

    #[test]
    fn test_render_requested_on_consume_only() {
        let mut h = Harness::new(input_tree(), KeyBindings::new());
        h.press(KeyEvent::new(KeyCode::F(9)));
        assert!(!h.ctx.requester().take());
        h.press(KeyEvent::char('x'));
        assert!(h.ctx.requester().take());
    }

    #[test]
    fn test_release_events_ignored() {
        let mut h = Harness::new(input_tree(), KeyBindings::new());
        let release = KeyEvent::char('x').with_state(KeyState::Release);
        assert_eq!(h.press(release), RouteOutcome::Dropped);
        assert_eq!(h.input_value("0"), "");
    }
}
