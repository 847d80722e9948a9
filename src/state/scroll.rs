//! Scroll Manager - per-element scroll offsets.
//!
//! Offsets are keyed by element id and outlive individual frames. Layout
//! reports content and viewport sizes every pass through
//! [`ScrollManager::update_dimensions`]; every mutation clamps the offset to
//! `0..=max(0, content - viewport)`.
//!
//! A region that is scrolled to the bottom stays there when its content grows
//! (sticky tail), which is what logs and chat transcripts want.

use std::collections::HashMap;

// =============================================================================
// SCROLL CONSTANTS
// =============================================================================

/// Default scroll amount for arrow keys (lines).
pub const LINE_SCROLL: u16 = 1;

/// Default scroll amount for Page Up/Down (90% of viewport).
pub const PAGE_SCROLL_FACTOR: f32 = 0.9;

// =============================================================================
// SCROLL STATE
// =============================================================================

/// Scroll position and extents for one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub offset_x: u16,
    pub offset_y: u16,
    pub content_width: u16,
    pub content_height: u16,
    pub viewport_width: u16,
    pub viewport_height: u16,
}

impl ScrollState {
    pub fn max_x(&self) -> u16 {
        self.content_width.saturating_sub(self.viewport_width)
    }

    pub fn max_y(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset_y >= self.max_y()
    }

    fn clamp(&mut self) {
        self.offset_x = self.offset_x.min(self.max_x());
        self.offset_y = self.offset_y.min(self.max_y());
    }
}

// =============================================================================
// SCROLL MANAGER
// =============================================================================

/// Scroll offsets for every element id that has reported dimensions.
#[derive(Debug, Default)]
pub struct ScrollManager {
    states: HashMap<String, ScrollState>,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report layout dimensions for `id`. Creates the entry, scrolled to the
    /// top, on first report.
    pub fn update_dimensions(
        &mut self,
        id: &str,
        content_width: u16,
        content_height: u16,
        viewport_width: u16,
        viewport_height: u16,
    ) {
        let is_new = !self.states.contains_key(id);
        let state = self.states.entry(id.to_string()).or_default();
        let was_at_bottom = !is_new && state.is_at_bottom();
        let grew = content_height > state.content_height;

        state.content_width = content_width;
        state.content_height = content_height;
        state.viewport_width = viewport_width;
        state.viewport_height = viewport_height;

        if was_at_bottom && grew {
            state.offset_y = state.max_y();
        }
        state.clamp();
    }

    pub fn get(&self, id: &str) -> Option<&ScrollState> {
        self.states.get(id)
    }

    /// Current (x, y) offset, `(0, 0)` for unknown ids.
    pub fn offset(&self, id: &str) -> (u16, u16) {
        self.states
            .get(id)
            .map(|s| (s.offset_x, s.offset_y))
            .unwrap_or((0, 0))
    }

    /// Set offset (clamped). Unknown ids are ignored.
    pub fn set_offset(&mut self, id: &str, x: u16, y: u16) {
        if let Some(state) = self.states.get_mut(id) {
            state.offset_x = x;
            state.offset_y = y;
            state.clamp();
        }
    }

    /// Scroll by a delta amount.
    ///
    /// Returns `true` if scrolling occurred, `false` if already at boundary.
    pub fn scroll_by(&mut self, id: &str, delta_x: i32, delta_y: i32) -> bool {
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };

        // Widen so extreme deltas saturate instead of overflowing
        let new_x = (state.offset_x as i64 + delta_x as i64).clamp(0, state.max_x() as i64) as u16;
        let new_y = (state.offset_y as i64 + delta_y as i64).clamp(0, state.max_y() as i64) as u16;

        if new_x == state.offset_x && new_y == state.offset_y {
            return false;
        }

        state.offset_x = new_x;
        state.offset_y = new_y;
        true
    }

    pub fn scroll_up(&mut self, id: &str, lines: u16) -> bool {
        self.scroll_by(id, 0, -(lines as i32))
    }

    pub fn scroll_down(&mut self, id: &str, lines: u16) -> bool {
        self.scroll_by(id, 0, lines as i32)
    }

    pub fn page_up(&mut self, id: &str) -> bool {
        let step = self.page_step(id);
        self.scroll_by(id, 0, -step)
    }

    pub fn page_down(&mut self, id: &str) -> bool {
        let step = self.page_step(id);
        self.scroll_by(id, 0, step)
    }

    fn page_step(&self, id: &str) -> i32 {
        let viewport = self.get(id).map(|s| s.viewport_height).unwrap_or(0);
        ((viewport as f32 * PAGE_SCROLL_FACTOR) as i32).max(1)
    }

    /// Scroll to top (set Y offset to 0, preserve X).
    pub fn scroll_to_top(&mut self, id: &str) -> bool {
        self.scroll_by(id, 0, i32::MIN / 2)
    }

    /// Scroll to bottom (set Y offset to max, preserve X).
    pub fn scroll_to_bottom(&mut self, id: &str) -> bool {
        self.scroll_by(id, 0, i32::MAX / 2)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
