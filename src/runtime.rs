//! Runtime - the render and input loop.
//!
//! One thread owns the tree, the cache, focus, scroll state and the frame
//! buffers. Each frame runs the pipeline in a fixed order:
//!
//! ```text
//! render fn -> Element tree -> reconcile + focus -> layout -> paint -> diff -> terminal
//! ```
//!
//! Between frames the loop polls the terminal for one input event at a time.
//! Frames are only produced when something asked for one: a consumed key, a
//! resize, or a [`RenderRequester`](crate::context::RenderRequester) signal
//! from a background thread.
//!
//! # Example
//!
//! ```no_run
//! use retui::element::Element;
//! use retui::runtime::Runtime;
//! use retui::terminal::CrosstermTerminal;
//! use retui::widgets::TextInput;
//!
//! fn main() -> retui::Result<()> {
//!     let mut runtime = Runtime::new(CrosstermTerminal::new(), || {
//!         Element::container()
//!             .child(Element::text("Name:"))
//!             .child(Element::component(TextInput::new().with_id("name")))
//!     });
//!     runtime.run()
//! }
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::component::{Component, ComponentRef};
use crate::context::AppContext;
use crate::element::Element;
use crate::error::Result;
use crate::layout::{ScrollRegion, compute_layout, find_scroll_region};
use crate::paint::{Origins, paint};
use crate::reconcile::{CachePolicy, Reconciler};
use crate::renderer::{DiffRenderer, FrameBuffer, FrameStats, ansi};
use crate::session::{self, SessionSnapshot};
use crate::state::focus::FocusManager;
use crate::state::global_keys::KeyBindings;
use crate::state::router::{EventRouter, RouteOutcome, RouteTarget};
use crate::state::scroll::ScrollManager;
use crate::terminal::{InputEvent, Terminal};

// =============================================================================
// CONFIG
// =============================================================================

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// How long each poll for input waits.
    pub tick: Duration,
    pub alternate_screen: bool,
    pub cache: CachePolicy,
    /// Treat Ctrl+D as an exit shortcut alongside Ctrl+C.
    pub exit_on_ctrl_d: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            alternate_screen: true,
            cache: CachePolicy::default(),
            exit_on_ctrl_d: true,
        }
    }
}

impl RuntimeConfig {
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_exit_on_ctrl_d(mut self, enabled: bool) -> Self {
        self.exit_on_ctrl_d = enabled;
        self
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

type RenderFn = Box<dyn FnMut() -> Element>;

/// A mounted application.
pub struct Runtime<T: Terminal> {
    terminal: T,
    config: RuntimeConfig,
    render_fn: RenderFn,
    ctx: AppContext,

    reconciler: Reconciler,
    focus: FocusManager,
    scroll: ScrollManager,
    router: EventRouter,

    renderer: DiffRenderer,
    buffer: FrameBuffer,
    tree: Element,
    region: Option<ScrollRegion>,
    pending_restore: Option<SessionSnapshot>,
}

impl<T: Terminal> Runtime<T> {
    /// Mount `render` on `terminal` with the default configuration.
    pub fn new<F>(terminal: T, render: F) -> Self
    where
        F: FnMut() -> Element + 'static,
    {
        Self::with_config(terminal, render, RuntimeConfig::default())
    }

    pub fn with_config<F>(terminal: T, render: F, config: RuntimeConfig) -> Self
    where
        F: FnMut() -> Element + 'static,
    {
        let router = EventRouter::new(KeyBindings::new()).with_exit_on_ctrl_d(config.exit_on_ctrl_d);
        Self {
            terminal,
            reconciler: Reconciler::new(config.cache),
            config,
            render_fn: Box::new(render),
            ctx: AppContext::new(),
            focus: FocusManager::new(),
            scroll: ScrollManager::new(),
            router,
            renderer: DiffRenderer::new(),
            buffer: FrameBuffer::new(0, 0),
            tree: Element::container(),
            region: None,
            pending_restore: None,
        }
    }

    /// Install the global key bindings, replacing any registered so far.
    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        *self.router.bindings_mut() = bindings;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        self.router.bindings_mut()
    }

    /// The last reconciled frame.
    pub fn tree(&self) -> &Element {
        &self.tree
    }

    /// Live component at `path` in the last frame.
    pub fn component_at(&self, path: &str) -> Option<ComponentRef> {
        self.tree.component_at(path)
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    pub fn scroll(&self) -> &ScrollManager {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollManager {
        &mut self.scroll
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn scroll_region(&self) -> Option<&ScrollRegion> {
        self.region.as_ref()
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Capture the state of every stateful component in the last frame.
    pub fn snapshot(&self) -> SessionSnapshot {
        session::snapshot(&self.tree)
    }

    /// Restore `snapshot` into the components of the next frame.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.pending_restore = Some(snapshot);
        self.ctx.request_render();
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Produce one frame and write it to the terminal.
    pub fn render_frame(&mut self) -> Result<FrameStats> {
        let (width, height) = self.terminal.size()?;
        if self.buffer.width() != width || self.buffer.height() != height {
            self.buffer.resize(width, height);
        }

        let mut tree = self.build_tree();
        if let Some(snapshot) = self.pending_restore.take() {
            let restored = session::restore(&tree, &snapshot);
            tracing::info!(restored, "session restored");
            // Outputs in `tree` predate the restore
            tree = self.build_tree();
        }

        self.region = find_scroll_region(&tree);
        let layout = compute_layout(&tree, width, height, self.region.as_ref().map(|r| r.path.as_str()))?;
        layout.walk(&mut |node| {
            if let Some(key) = &node.scroll_key {
                self.scroll.update_dimensions(
                    key,
                    node.content_width,
                    node.content_height,
                    node.inner_width(),
                    node.inner_height(),
                );
            }
        });

        let origins = paint(&layout, &mut self.buffer, &self.scroll);
        let cursor = self.cursor_position(&origins);

        let (bytes, stats) = self.renderer.render(&self.buffer, cursor)?;
        if !bytes.is_empty() {
            self.terminal.write(&bytes)?;
        }
        tracing::trace!(
            full = stats.full,
            dirty = stats.dirty_cells,
            runs = stats.runs,
            bytes = stats.bytes,
            "frame"
        );

        self.tree = tree;
        Ok(stats)
    }

    /// Render the application and run reconciliation and focus over it.
    fn build_tree(&mut self) -> Element {
        let render = &mut self.render_fn;
        let mut tree = match panic::catch_unwind(AssertUnwindSafe(|| render())) {
            Ok(tree) => tree,
            Err(_) => {
                tracing::warn!("application render panicked");
                Element::error("application failed to render")
            }
        };
        self.focus.rebuild(&mut tree, &mut self.reconciler);
        tree
    }

    /// Hardware cursor for the focused component, if it wants one.
    fn cursor_position(&self, origins: &Origins) -> Option<(u16, u16)> {
        let entry = self.focus.focused()?;
        let origin = origins.get(&entry.path)?;
        let offset = {
            let mut guard = entry.component.try_borrow_mut().ok()?;
            let component: &mut dyn Component = &mut *guard;
            component.focusable()?.cursor_offset()?
        };
        origin.place(offset.0, offset.1)
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Handle one input event.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<Option<RouteOutcome>> {
        match event {
            InputEvent::Key(key) => {
                let target = RouteTarget {
                    tree: &self.tree,
                    focus: &mut self.focus,
                    scroll: &mut self.scroll,
                    scroll_region: self.region.as_ref().map(|r| r.key.as_str()),
                };
                Ok(Some(self.router.route(&key, target, &self.ctx)))
            }
            InputEvent::Resize(width, height) => {
                self.handle_resize(width, height)?;
                Ok(None)
            }
            InputEvent::None => Ok(None),
        }
    }

    /// Forget the previous frame and clear the screen; the next frame is full.
    pub fn handle_resize(&mut self, width: u16, height: u16) -> Result<()> {
        tracing::debug!(width, height, "resize");
        self.renderer.invalidate();
        self.buffer.resize(width, height);
        let mut clear = Vec::new();
        ansi::clear_screen(&mut clear)?;
        self.terminal.write(&clear)?;
        self.ctx.request_render();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Loop
    // -------------------------------------------------------------------------

    /// Run one iteration: render if requested, then poll for one event.
    ///
    /// Returns false once the application should stop.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.ctx.is_running() {
            return Ok(false);
        }

        if self.ctx.requester().take() {
            self.render_frame()?;
        }

        if let Some(event) = self.terminal.poll_event(self.config.tick)? {
            self.handle_event(event)?;
        }

        Ok(self.ctx.is_running())
    }

    /// Acquire the terminal and run until an exit shortcut or
    /// [`AppContext::quit`].
    pub fn run(&mut self) -> Result<()> {
        self.terminal.start(self.config.alternate_screen)?;
        tracing::info!("runtime started");

        self.ctx.request_render();
        let result = self.run_loop();

        let stopped = self.terminal.stop();
        tracing::info!("runtime stopped");
        result.and(stopped)
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.tick()? {}
        Ok(())
    }
}
