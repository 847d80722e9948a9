//! Tab bar that switches panels on Alt+1..9.

use crate::component::{Component, KeyHandler, PropsUpdater, downcast_ref};
use crate::context::{AppContext, Callback};
use crate::element::Element;
use crate::state::keyboard::{KeyCode, KeyEvent, Modifier};

/// A row of tab labels above the active panel.
///
/// The bar never takes focus itself. It listens through the tree-wide handler
/// layer, so Alt+N switches tabs even while an input inside a panel is
/// focused and would otherwise swallow the digit.
#[derive(Debug, Default)]
pub struct TabBar {
    labels: Vec<String>,
    panels: Vec<Element>,
    on_change: Option<Callback<usize>>,

    // State
    active: usize,
}

impl TabBar {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Panels shown under the bar, one per label.
    pub fn with_panels(mut self, panels: impl IntoIterator<Item = Element>) -> Self {
        self.panels = panels.into_iter().collect();
        self
    }

    pub fn on_change(mut self, callback: Callback<usize>) -> Self {
        self.on_change = Some(callback);
        self
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Activate tab `index`. Returns false when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.labels.len() {
            return false;
        }
        self.active = index;
        true
    }
}

impl Component for TabBar {
    fn render(&self) -> Element {
        let tabs = self.labels.iter().enumerate().map(|(i, label)| {
            let tab = Element::text(format!(" {} {} ", i + 1, label));
            if i == self.active {
                tab.styled("inverse", "true").styled("bold", "true")
            } else {
                tab
            }
        });
        let bar = Element::container()
            .styled("flex-direction", "row")
            .styled("flex-shrink", "0")
            .with_class("tab-bar")
            .with_children(tabs);

        let mut root = Element::container().styled("flex-grow", "1").child(bar);
        if let Some(panel) = self.panels.get(self.active) {
            root = root.child(panel.clone().with_key(format!("panel-{}", self.active)));
        }
        root
    }

    fn key_handler(&mut self) -> Option<&mut dyn KeyHandler> {
        Some(self)
    }

    fn props_updater(&mut self) -> Option<&mut dyn PropsUpdater> {
        Some(self)
    }
}

impl KeyHandler for TabBar {
    fn handle_global_key(&mut self, event: &KeyEvent, ctx: &AppContext) -> bool {
        let KeyCode::Char(c) = event.code else {
            return false;
        };
        if event.modifiers - Modifier::SHIFT != Modifier::ALT {
            return false;
        }
        let Some(n) = c.to_digit(10).filter(|&n| n >= 1) else {
            return false;
        };

        let index = n as usize - 1;
        if !self.select(index) {
            return false;
        }
        if let Some(cb) = &self.on_change {
            cb.call(ctx, index);
        }
        true
    }
}

impl PropsUpdater for TabBar {
    fn update_props(&mut self, fresh: &dyn Component) {
        let Some(fresh) = downcast_ref::<TabBar>(fresh) else {
            return;
        };
        self.labels = fresh.labels.clone();
        self.panels = fresh.panels.clone();
        self.on_change = fresh.on_change.clone();
        if self.active >= self.labels.len() {
            self.active = 0;
        }
    }
}
