//! End-to-end tests for the render and input loop.
//!
//! Every test mounts an application on a [`MockTerminal`] and drives it the
//! way the loop does: queue input, route it, render a frame, then inspect the
//! live components and the replayed screen.
//!
//! Run with: cargo test --test runtime

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use retui::component::{AsAny, Component, downcast_ref};
use retui::reconcile::CacheKey;
use retui::state::router::Layer;
use retui::widgets::{Dialog, TabBar, TextInput};
use retui::{
    Element, Error, InputEvent, KeyBindings, KeyCode, KeyEvent, MockTerminal, Modifier,
    RouteOutcome, Runtime, SessionSnapshot, Trigger,
};

// =============================================================================
// HELPERS
// =============================================================================

fn input_value(rt: &Runtime<MockTerminal>, path: &str) -> String {
    let component = rt.component_at(path).expect("no component at path");
    let guard = component.borrow();
    let c: &dyn Component = &*guard;
    downcast_ref::<TextInput>(c).expect("not a TextInput").value()
}

fn send(rt: &mut Runtime<MockTerminal>, key: KeyEvent) -> RouteOutcome {
    rt.handle_event(InputEvent::Key(key))
        .expect("route failed")
        .expect("keys always produce an outcome")
}

fn type_str(rt: &mut Runtime<MockTerminal>, text: &str) {
    for c in text.chars() {
        send(rt, KeyEvent::char(c));
    }
}

/// Row `y` of the replayed screen, right-trimmed.
trait ScreenRow {
    fn screen_row_text(&self, y: u16) -> String;
}

impl ScreenRow for Runtime<MockTerminal> {
    fn screen_row_text(&self, y: u16) -> String {
        self.terminal().screen_row(y).trim_end().to_string()
    }
}

fn two_inputs() -> Element {
    Element::container()
        .child(Element::component(TextInput::new()))
        .child(Element::component(TextInput::new()))
}

struct Counter(Rc<Cell<u32>>);

impl Component for Counter {
    fn render(&self) -> Element {
        Element::text(format!("count: {}", self.0.get()))
    }
}

struct Boom;

impl Component for Boom {
    fn render(&self) -> Element {
        panic!("boom")
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

#[test]
fn instances_survive_rebuilds() {
    let mut rt = Runtime::new(MockTerminal::new(20, 4), two_inputs);
    rt.render_frame().expect("frame");
    let first = rt.component_at("0").expect("input");

    rt.render_frame().expect("frame");
    let second = rt.component_at("0").expect("input");

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(rt.reconciler().cache().len(), 2);
}

#[test]
fn state_is_isolated_per_path() {
    let mut rt = Runtime::new(MockTerminal::new(20, 4), two_inputs);
    rt.render_frame().expect("frame");
    assert_eq!(rt.focus().focused().map(|e| e.path.as_str()), Some("0"));

    type_str(&mut rt, "x");
    rt.render_frame().expect("frame");

    assert_eq!(input_value(&rt, "0"), "x");
    assert_eq!(input_value(&rt, "1"), "");
}

#[test]
fn inserting_a_sibling_shifts_identity() {
    let show_banner = Rc::new(Cell::new(false));
    let flag = show_banner.clone();
    let mut rt = Runtime::new(MockTerminal::new(20, 4), move || {
        let mut root = Element::container();
        if flag.get() {
            root = root.child(Element::text("banner"));
        }
        root.child(Element::component(TextInput::new()))
    });

    rt.render_frame().expect("frame");
    type_str(&mut rt, "hi");
    rt.render_frame().expect("frame");
    assert_eq!(input_value(&rt, "0"), "hi");

    // Same type at a new path is a new instance
    show_banner.set(true);
    rt.render_frame().expect("frame");
    assert_eq!(input_value(&rt, "1"), "");
    assert!(rt.reconciler().cache().contains(&CacheKey::of::<TextInput>("0")));

    // The unused instance is still cached and comes back
    show_banner.set(false);
    rt.render_frame().expect("frame");
    assert_eq!(input_value(&rt, "0"), "hi");
}

#[test]
fn keyed_children_keep_state_when_reordered() {
    let swapped = Rc::new(Cell::new(false));
    let flag = swapped.clone();
    let mut rt = Runtime::new(MockTerminal::new(20, 4), move || {
        let a = Element::component(TextInput::new()).with_key("a");
        let b = Element::component(TextInput::new()).with_key("b");
        let children = if flag.get() { vec![b, a] } else { vec![a, b] };
        Element::container().with_children(children)
    });

    rt.render_frame().expect("frame");
    type_str(&mut rt, "first");
    rt.render_frame().expect("frame");

    swapped.set(true);
    rt.render_frame().expect("frame");
    assert_eq!(input_value(&rt, "#a"), "first");
    assert_eq!(input_value(&rt, "#b"), "");
    assert_eq!(rt.screen_row_text(1), "first");
}

#[test]
fn render_panic_is_contained_to_its_subtree() {
    let mut rt = Runtime::new(MockTerminal::new(40, 4), || {
        Element::container()
            .child(Element::component(Boom))
            .child(Element::text("still here"))
    });
    rt.render_frame().expect("frame");

    assert!(rt.screen_row_text(0).contains("Boom failed to render"));
    assert_eq!(rt.screen_row_text(1), "still here");
}

#[test]
fn app_render_panic_shows_placeholder() {
    let mut rt = Runtime::new(MockTerminal::new(40, 2), || -> Element {
        panic!("no tree today")
    });
    rt.render_frame().expect("frame");
    assert!(rt.screen_row_text(0).contains("application failed to render"));
}

// =============================================================================
// FOCUS
// =============================================================================

#[test]
fn tab_cycles_and_wraps() {
    let mut rt = Runtime::new(MockTerminal::new(20, 4), || {
        Element::container()
            .child(Element::component(TextInput::new()))
            .child(Element::component(TextInput::new()))
            .child(Element::component(TextInput::new()))
    });
    rt.render_frame().expect("frame");
    assert_eq!(rt.focus().focus_index(), Some(0));

    for expected in [1, 2, 0] {
        let outcome = send(&mut rt, KeyEvent::new(KeyCode::Tab));
        assert_eq!(outcome, RouteOutcome::Consumed(Layer::FocusCycle));
        assert_eq!(rt.focus().focus_index(), Some(expected));
    }

    send(&mut rt, KeyEvent::with_modifiers(KeyCode::Tab, Modifier::SHIFT));
    assert_eq!(rt.focus().focus_index(), Some(2));
}

#[test]
fn focus_follows_id_across_reorder() {
    let rotated = Rc::new(Cell::new(false));
    let flag = rotated.clone();
    let mut rt = Runtime::new(MockTerminal::new(20, 4), move || {
        let ids = if flag.get() { ["c", "a", "b"] } else { ["a", "b", "c"] };
        Element::container().with_children(
            ids.into_iter()
                .map(|id| Element::component(TextInput::new().with_id(id))),
        )
    });
    rt.render_frame().expect("frame");
    send(&mut rt, KeyEvent::new(KeyCode::Tab));
    assert_eq!(rt.focus().focused().and_then(|e| e.id.as_deref()), Some("b"));

    rotated.set(true);
    rt.render_frame().expect("frame");
    let focused = rt.focus().focused().expect("focus kept");
    assert_eq!(focused.id.as_deref(), Some("b"));
    assert_eq!(focused.path, "2");
}

#[test]
fn focus_index_falls_back_when_list_shrinks() {
    let count = Rc::new(Cell::new(3));
    let n = count.clone();
    let mut rt = Runtime::new(MockTerminal::new(20, 4), move || {
        Element::container()
            .with_children((0..n.get()).map(|_| Element::component(TextInput::new())))
    });
    rt.render_frame().expect("frame");
    rt.focus_mut().focus_index_at(2);

    count.set(2);
    rt.render_frame().expect("frame");
    assert_eq!(rt.focus().focus_index(), Some(0));

    count.set(0);
    rt.render_frame().expect("frame");
    assert_eq!(rt.focus().focus_index(), None);
}

#[test]
fn focused_input_places_the_cursor() {
    let mut rt = Runtime::new(MockTerminal::new(20, 4), || {
        Element::container()
            .child(Element::text("Name:"))
            .child(Element::component(TextInput::new()))
    });
    rt.render_frame().expect("frame");
    type_str(&mut rt, "ab");
    rt.render_frame().expect("frame");

    let last = String::from_utf8_lossy(rt.terminal().last_write().expect("write")).to_string();
    assert!(last.contains("\x1b[2;3H"), "cursor not placed: {last:?}");
    assert_eq!(rt.screen_row_text(1), "ab");
}

// =============================================================================
// ROUTING
// =============================================================================

#[test]
fn bindings_run_before_the_focused_input() {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let mut bindings = KeyBindings::new();
    bindings.on(Trigger::ctrl('o'), move |_, _| {
        h.set(h.get() + 1);
        true
    });

    let mut rt = Runtime::new(MockTerminal::new(20, 4), two_inputs).with_bindings(bindings);
    rt.render_frame().expect("frame");

    let outcome = send(&mut rt, KeyEvent::ctrl('o'));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::Binding));
    assert_eq!(hits.get(), 1);

    let outcome = send(&mut rt, KeyEvent::char('a'));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::Focused));
    assert_eq!(hits.get(), 1);
    assert_eq!(input_value(&rt, "0"), "a");
}

#[test]
fn exit_shortcut_stops_the_context() {
    let mut rt = Runtime::new(MockTerminal::new(20, 4), two_inputs);
    rt.render_frame().expect("frame");
    assert_eq!(send(&mut rt, KeyEvent::ctrl('c')), RouteOutcome::Exit);
    assert!(!rt.context().is_running());
}

#[test]
fn escape_closes_an_open_dialog_first() {
    let mut rt = Runtime::new(MockTerminal::new(30, 8), || {
        Element::container()
            .child(Element::component(TextInput::new().with_id("name")))
            .child(Element::component(Dialog::new("Confirm", "Really?")))
    });
    rt.render_frame().expect("frame");

    let dialog = rt.component_at("1").expect("dialog");
    {
        let mut guard = dialog.borrow_mut();
        let c: &mut dyn Component = &mut *guard;
        c.as_any_mut()
            .downcast_mut::<Dialog>()
            .expect("not a Dialog")
            .open();
    }
    rt.render_frame().expect("frame");
    assert!(rt.terminal().screen_text().contains("Really?"));

    let outcome = send(&mut rt, KeyEvent::new(KeyCode::Escape));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::ModalEscape));
    rt.render_frame().expect("frame");
    assert!(!rt.terminal().screen_text().contains("Really?"));

    // Nothing left to close; the input ignores Escape
    assert_eq!(send(&mut rt, KeyEvent::new(KeyCode::Escape)), RouteOutcome::Dropped);
}

#[test]
fn tab_bar_switches_while_an_input_is_focused() {
    let mut rt = Runtime::new(MockTerminal::new(40, 6), || {
        Element::component(TabBar::new(["One", "Two"]).with_panels([
            Element::container().child(Element::component(TextInput::new().with_id("field"))),
            Element::text("second panel"),
        ]))
    });
    rt.render_frame().expect("frame");
    assert_eq!(rt.focus().focused().and_then(|e| e.id.as_deref()), Some("field"));

    let outcome = send(&mut rt, KeyEvent::alt('2'));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::TreeHandler));

    rt.render_frame().expect("frame");
    assert!(rt.terminal().screen_text().contains("second panel"));
    assert!(rt.focus().focused().is_none());
}

// =============================================================================
// SCROLL
// =============================================================================

fn log_app(lines: Rc<Cell<usize>>) -> impl FnMut() -> Element {
    move || {
        Element::container()
            .child(Element::text("Header"))
            .child(
                Element::container()
                    .with_id("log")
                    .styled("overflow", "auto")
                    .styled("flex-grow", "1")
                    .with_children((0..lines.get()).map(|i| Element::text(format!("line {i}")))),
            )
    }
}

#[test]
fn scroll_keys_move_and_clamp_the_region() {
    let mut rt = Runtime::new(MockTerminal::new(20, 6), log_app(Rc::new(Cell::new(20))));
    rt.render_frame().expect("frame");
    assert_eq!(rt.scroll_region().map(|r| r.key.as_str()), Some("log"));
    assert_eq!(rt.scroll().offset("log"), (0, 0));

    // Already at the top
    assert_eq!(send(&mut rt, KeyEvent::new(KeyCode::Up)), RouteOutcome::Dropped);

    let outcome = send(&mut rt, KeyEvent::new(KeyCode::Down));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::Scroll));
    assert_eq!(rt.scroll().offset("log"), (0, 1));

    rt.render_frame().expect("frame");
    assert!(rt.screen_row_text(1).starts_with("line 1"));

    send(&mut rt, KeyEvent::with_modifiers(KeyCode::End, Modifier::CTRL));
    assert_eq!(rt.scroll().offset("log"), (0, 15));
    assert_eq!(send(&mut rt, KeyEvent::new(KeyCode::PageDown)), RouteOutcome::Dropped);

    send(&mut rt, KeyEvent::with_modifiers(KeyCode::Home, Modifier::CTRL));
    assert_eq!(rt.scroll().offset("log"), (0, 0));
}

#[test]
fn region_at_bottom_follows_new_content() {
    let lines = Rc::new(Cell::new(20));
    let mut rt = Runtime::new(MockTerminal::new(20, 6), log_app(lines.clone()));
    rt.render_frame().expect("frame");
    send(&mut rt, KeyEvent::with_modifiers(KeyCode::End, Modifier::CTRL));

    lines.set(25);
    rt.render_frame().expect("frame");
    assert_eq!(rt.scroll().offset("log"), (0, 20));
    assert!(rt.screen_row_text(5).starts_with("line 24"));
}

struct LogView(usize);

impl Component for LogView {
    fn render(&self) -> Element {
        Element::container().with_children((0..self.0).map(|i| Element::text(format!("entry {i}"))))
    }
}

#[test]
fn growing_component_scrolls_as_the_region() {
    let mut rt = Runtime::new(MockTerminal::new(20, 6), || {
        Element::container()
            .child(Element::text("Header"))
            .child(Element::component(LogView(30)).with_id("log").styled("flex-grow", "1"))
    });
    rt.render_frame().expect("frame");
    assert_eq!(rt.scroll_region().map(|r| r.path.as_str()), Some("1"));

    let outcome = send(&mut rt, KeyEvent::new(KeyCode::Down));
    assert_eq!(outcome, RouteOutcome::Consumed(Layer::Scroll));
    assert_eq!(rt.scroll().offset("log"), (0, 1));

    rt.render_frame().expect("frame");
    assert_eq!(rt.screen_row_text(0), "Header");
    assert!(rt.screen_row_text(1).starts_with("entry 1"));

    send(&mut rt, KeyEvent::with_modifiers(KeyCode::End, Modifier::CTRL));
    assert_eq!(rt.scroll().offset("log"), (0, 25));
}

// =============================================================================
// OUTPUT
// =============================================================================

#[test]
fn unchanged_frame_writes_nothing() {
    let count = Rc::new(Cell::new(1));
    let c = count.clone();
    let mut rt = Runtime::new(MockTerminal::new(20, 3), move || {
        Element::component(Counter(c.clone()))
    });

    let stats = rt.render_frame().expect("frame");
    assert!(stats.full);
    assert_eq!(rt.screen_row_text(0), "count: 1");
    let writes = rt.terminal().writes().len();

    let stats = rt.render_frame().expect("frame");
    assert!(!stats.full);
    assert_eq!(stats.dirty_cells, 0);
    assert_eq!(rt.terminal().writes().len(), writes);

    count.set(2);
    let stats = rt.render_frame().expect("frame");
    assert_eq!(stats.dirty_cells, 1);
    assert_eq!(stats.runs, 1);
    assert_eq!(rt.terminal().writes().len(), writes + 1);
    assert_eq!(rt.screen_row_text(0), "count: 2");
}

#[test]
fn resize_forces_a_full_frame() {
    let mut rt = Runtime::new(MockTerminal::new(20, 3), || Element::text("hello"));
    rt.render_frame().expect("frame");

    rt.terminal_mut().set_size(30, 5);
    rt.handle_event(InputEvent::Resize(30, 5)).expect("resize");
    let stats = rt.render_frame().expect("frame");

    assert!(stats.full);
    assert_eq!(rt.buffer().width(), 30);
    assert_eq!(rt.buffer().height(), 5);
    assert_eq!(rt.screen_row_text(0), "hello");
}

// =============================================================================
// LOOP
// =============================================================================

#[test]
fn run_requires_a_tty() {
    let mut rt = Runtime::new(MockTerminal::new(20, 3).without_tty(), || Element::text("x"));
    assert!(matches!(rt.run(), Err(Error::NoTty)));
    assert!(rt.terminal().writes().is_empty());
}

#[test]
fn run_processes_input_until_ctrl_c() {
    let mut term = MockTerminal::new(20, 3);
    term.push_key(KeyEvent::char('h'));
    term.push_key(KeyEvent::char('i'));
    term.push_key(KeyEvent::ctrl('c'));

    let mut rt = Runtime::new(term, || {
        Element::container().child(Element::component(TextInput::new()))
    });
    rt.run().expect("run");

    assert!(!rt.terminal().is_started());
    assert_eq!(input_value(&rt, "0"), "hi");
    assert_eq!(rt.screen_row_text(0), "hi");
}

#[test]
fn background_requests_trigger_a_frame() {
    let hits = Arc::new(AtomicU32::new(0));
    let shown = Rc::new(Cell::new(0));
    let (source, sink) = (hits.clone(), shown.clone());
    let mut rt = Runtime::new(MockTerminal::new(20, 3), move || {
        sink.set(source.load(Ordering::SeqCst));
        Element::component(Counter(sink.clone()))
    });
    rt.render_frame().expect("frame");
    assert!(rt.tick().expect("tick"));
    let writes = rt.terminal().writes().len();

    let requester = rt.context().requester();
    let worker = hits.clone();
    std::thread::spawn(move || {
        worker.fetch_add(1, Ordering::SeqCst);
        requester.request();
    })
    .join()
    .expect("worker panicked");

    assert!(rt.tick().expect("tick"));
    assert_eq!(rt.terminal().writes().len(), writes + 1);
    assert_eq!(rt.screen_row_text(0), "count: 1");
}

// =============================================================================
// SESSION
// =============================================================================

fn form() -> Element {
    Element::container()
        .child(Element::component(TextInput::new().with_id("name")))
        .child(Element::component(TextInput::new().with_id("email")))
}

#[test]
fn session_round_trips_through_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    let mut rt = Runtime::new(MockTerminal::new(20, 4), form);
    rt.render_frame().expect("frame");
    type_str(&mut rt, "bob");
    rt.render_frame().expect("frame");
    rt.snapshot().save(&path).expect("save");

    let mut restored = Runtime::new(MockTerminal::new(20, 4), form);
    restored.restore(SessionSnapshot::load(&path).expect("load"));
    restored.render_frame().expect("frame");

    assert_eq!(input_value(&restored, "0"), "bob");
    assert_eq!(input_value(&restored, "1"), "");
    assert_eq!(restored.screen_row_text(0), "bob");
}

#[test]
fn missing_session_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = SessionSnapshot::load(dir.path().join("absent.json")).expect_err("should fail");
    assert!(matches!(err, Error::Session { .. }));
}
