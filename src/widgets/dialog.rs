//! Modal dialog.

use crate::component::{Component, Modal, PropsUpdater, downcast_ref};
use crate::element::Element;

/// A bordered overlay with a title and a body, dismissed with Escape.
///
/// Closed dialogs render as `display: none` and take no space.
#[derive(Debug, Default)]
pub struct Dialog {
    title: String,
    body: String,
    dismissable: bool,

    // State
    open: bool,
    pending_close: bool,
}

impl Dialog {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            dismissable: true,
            ..Self::default()
        }
    }

    /// Whether Escape closes the dialog (default true).
    pub fn dismissable(mut self, dismissable: bool) -> Self {
        self.dismissable = dismissable;
        self
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_visible(&self) -> bool {
        self.open
    }

    /// Whether the dialog was closed since the last call.
    pub fn take_closed(&mut self) -> bool {
        std::mem::take(&mut self.pending_close)
    }
}

impl Component for Dialog {
    fn render(&self) -> Element {
        if !self.open {
            return Element::container().styled("display", "none");
        }
        Element::container()
            .styled("border", "rounded")
            .styled("padding", "0 1")
            .styled("flex-shrink", "0")
            .with_class("dialog")
            .child(Element::text(self.title.clone()).styled("bold", "true"))
            .child(Element::text(self.body.clone()))
    }

    fn modal(&mut self) -> Option<&mut dyn Modal> {
        Some(self)
    }

    fn props_updater(&mut self) -> Option<&mut dyn PropsUpdater> {
        Some(self)
    }
}

impl Modal for Dialog {
    fn is_open(&self) -> bool {
        self.open
    }

    fn should_close_on_escape(&self) -> bool {
        self.dismissable
    }

    fn close(&mut self) {
        self.open = false;
        self.pending_close = true;
    }
}

impl PropsUpdater for Dialog {
    fn update_props(&mut self, fresh: &dyn Component) {
        let Some(fresh) = downcast_ref::<Dialog>(fresh) else {
            return;
        };
        self.title = fresh.title.clone();
        self.body = fresh.body.clone();
        self.dismissable = fresh.dismissable;
    }
}
