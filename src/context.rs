//! Application context handle and author callbacks.
//!
//! Every author callback has one canonical shape: it receives the
//! [`AppContext`] and a payload. Simpler closures are adapted into that shape
//! by [`Callback::from_fn`] and [`Callback::unit`], so dispatch never needs to
//! inspect a callback's signature at runtime.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// RENDER REQUESTER
// =============================================================================

/// Thread-safe, one-way "please re-render" signal.
///
/// Background work (a streaming response appending text, a timer) clones
/// this and calls [`request`](Self::request) after it has finished mutating
/// component state under that component's own lock. The render loop checks
/// the flag every tick and performs a full frame on its own thread.
#[derive(Clone, Debug, Default)]
pub struct RenderRequester {
    pending: Arc<AtomicBool>,
}

impl RenderRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop for a frame. Coalesces with any request already pending.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending request. Returns true if one was pending.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

// =============================================================================
// APP CONTEXT
// =============================================================================

/// Handle passed to key handlers and callbacks.
#[derive(Clone, Debug)]
pub struct AppContext {
    running: Arc<AtomicBool>,
    requester: RenderRequester,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            requester: RenderRequester::new(),
        }
    }

    /// Request a frame.
    pub fn request_render(&self) {
        self.requester.request();
    }

    /// A cloneable requester for background threads.
    pub fn requester(&self) -> RenderRequester {
        self.requester.clone()
    }

    /// Stop the render loop after the current event.
    pub fn quit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared running flag (for wiring into external shutdown logic).
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// CALLBACK
// =============================================================================

/// An author callback: `fn(&AppContext, payload)`.
pub struct Callback<P = ()> {
    f: Rc<dyn Fn(&AppContext, P)>,
}

impl<P: 'static> Callback<P> {
    /// Canonical form: receives the context and the payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&AppContext, P) + 'static,
    {
        Self { f: Rc::new(f) }
    }

    /// Adapt a payload-only closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(P) + 'static,
    {
        Self::new(move |_, payload| f(payload))
    }

    pub fn call(&self, ctx: &AppContext, payload: P) {
        (self.f)(ctx, payload)
    }
}

impl Callback<()> {
    /// Adapt a closure that takes nothing.
    pub fn unit<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::new(move |_, ()| f())
    }
}

impl<P> Clone for Callback<P> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<P> fmt::Debug for Callback<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_requester_coalesces() {
        let requester = RenderRequester::new();
        assert!(!requester.take());

        requester.request();
        requester.request();
        assert!(requester.is_pending());
        assert!(requester.take());
        assert!(!requester.take());
    }

    #[test]
    fn test_requester_across_threads() {
        let ctx = AppContext::new();
        let requester = ctx.requester();
        std::thread::spawn(move || requester.request())
            .join()
            .expect("thread panicked");
        assert!(ctx.requester().take());
    }

    #[test]
    fn test_quit() {
        let ctx = AppContext::new();
        assert!(ctx.is_running());
        ctx.clone().quit();
        assert!(!ctx.is_running());
    }

    #[test]
    fn test_callback_adapters_share_one_shape() {
        let ctx = AppContext::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let full = Callback::new(move |ctx: &AppContext, v: String| {
            ctx.request_render();
            s.borrow_mut().push(v);
        });
        let s = seen.clone();
        let payload_only = Callback::from_fn(move |v: String| s.borrow_mut().push(v));

        full.call(&ctx, "a".to_string());
        payload_only.call(&ctx, "b".to_string());

        assert_eq!(*seen.borrow(), vec!["a", "b"]);
        assert!(ctx.requester().take());
    }

    #[test]
    fn test_unit_callback() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let cb = Callback::unit(move || c.set(c.get() + 1));
        cb.call(&AppContext::new(), ());
        cb.clone().call(&AppContext::new(), ());
        assert_eq!(count.get(), 2);
    }
}
