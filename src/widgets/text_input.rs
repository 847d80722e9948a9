//! Single-line text input.

use crate::component::{Component, Focusable, PropsUpdater, Stateful, downcast_ref};
use crate::context::{AppContext, Callback};
use crate::element::Element;
use crate::error::Result;
use crate::session::StateMap;
use crate::state::keyboard::{KeyCode, KeyEvent, Modifier};

// =============================================================================
// Word Boundary Helpers
// =============================================================================

/// Start of the word before `pos`. A word is a run of alphanumeric characters.
fn find_word_start(chars: &[char], pos: usize) -> usize {
    let mut i = pos.min(chars.len());
    while i > 0 && !chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    while i > 0 && chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    i
}

/// End of the word after `pos`.
fn find_word_end(chars: &[char], pos: usize) -> usize {
    let len = chars.len();
    let mut i = pos.min(len);
    while i < len && !chars[i].is_alphanumeric() {
        i += 1;
    }
    while i < len && chars[i].is_alphanumeric() {
        i += 1;
    }
    i
}

/// Adjust a horizontal scroll offset so the cursor stays within `visible_width`.
pub fn ensure_cursor_visible(cursor: usize, scroll: usize, visible_width: usize) -> usize {
    if visible_width == 0 {
        return cursor;
    }
    if cursor < scroll {
        cursor
    } else if cursor >= scroll.saturating_add(visible_width) {
        cursor + 1 - visible_width
    } else {
        scroll
    }
}

// =============================================================================
// TextInput
// =============================================================================

/// A single-line editable field.
///
/// Value and cursor survive re-renders (the reconciler keeps the instance)
/// and process restarts (through [`Stateful`]). Enter fires `on_submit` and
/// is then passed on, so global handlers can react to submission too.
#[derive(Debug, Default)]
pub struct TextInput {
    id: String,
    placeholder: String,
    width: Option<u16>,
    disabled: bool,
    on_change: Option<Callback<String>>,
    on_submit: Option<Callback<String>>,

    // State
    chars: Vec<char>,
    cursor: usize,
    scroll: usize,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Visible width in cells. Longer values scroll horizontally.
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn on_change(mut self, callback: Callback<String>) -> Self {
        self.on_change = Some(callback);
        self
    }

    pub fn on_submit(mut self, callback: Callback<String>) -> Self {
        self.on_submit = Some(callback);
        self
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    /// Replace the value and move the cursor to its end.
    pub fn set_value(&mut self, value: &str) {
        self.chars = value.chars().collect();
        self.cursor = self.chars.len();
        self.follow_cursor();
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn visible_width(&self) -> usize {
        self.width.map(usize::from).unwrap_or(usize::MAX)
    }

    fn follow_cursor(&mut self) {
        self.scroll = ensure_cursor_visible(self.cursor, self.scroll, self.visible_width());
    }

    fn changed(&mut self, ctx: &AppContext) {
        self.follow_cursor();
        if let Some(cb) = &self.on_change {
            cb.call(ctx, self.value());
        }
    }

    fn move_to(&mut self, pos: usize) {
        self.cursor = pos.min(self.chars.len());
        self.follow_cursor();
    }
}

impl Component for TextInput {
    fn render(&self) -> Element {
        let mut text = if self.chars.is_empty() && !self.focused {
            Element::text(self.placeholder.clone()).styled("dim", "true")
        } else {
            let end = self.scroll.saturating_add(self.visible_width()).min(self.chars.len());
            let start = self.scroll.min(end);
            Element::text(self.chars[start..end].iter().collect::<String>())
        };
        text = text.styled("height", "1");
        if let Some(width) = self.width {
            text = text.styled("width", width.to_string());
        }
        if self.focused {
            text = text.styled("underline", "true");
        }
        if self.disabled {
            text = text.styled("dim", "true");
        }
        text
    }

    fn focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn stateful(&mut self) -> Option<&mut dyn Stateful> {
        Some(self)
    }

    fn props_updater(&mut self) -> Option<&mut dyn PropsUpdater> {
        Some(self)
    }
}

impl Focusable for TextInput {
    fn handle_key(&mut self, event: &KeyEvent, ctx: &AppContext) -> bool {
        if let Some(c) = event.printable() {
            self.chars.insert(self.cursor, c);
            self.cursor += 1;
            self.changed(ctx);
            return true;
        }

        let word = event.modifiers.contains(Modifier::CTRL);
        match event.code {
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let start = if word {
                        find_word_start(&self.chars, self.cursor)
                    } else {
                        self.cursor - 1
                    };
                    self.chars.drain(start..self.cursor);
                    self.cursor = start;
                    self.changed(ctx);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.chars.len() {
                    let end = if word {
                        find_word_end(&self.chars, self.cursor)
                    } else {
                        self.cursor + 1
                    };
                    self.chars.drain(self.cursor..end);
                    self.changed(ctx);
                }
                true
            }
            KeyCode::Left => {
                let to = if word {
                    find_word_start(&self.chars, self.cursor)
                } else {
                    self.cursor.saturating_sub(1)
                };
                self.move_to(to);
                true
            }
            KeyCode::Right => {
                let to = if word {
                    find_word_end(&self.chars, self.cursor)
                } else {
                    self.cursor + 1
                };
                self.move_to(to);
                true
            }
            KeyCode::Home if !word => {
                self.move_to(0);
                true
            }
            KeyCode::End if !word => {
                self.move_to(self.chars.len());
                true
            }
            KeyCode::Char('u') if event.is_ctrl('u') => {
                self.chars.drain(..self.cursor);
                self.cursor = 0;
                self.changed(ctx);
                true
            }
            KeyCode::Enter => {
                if let Some(cb) = &self.on_submit {
                    cb.call(ctx, self.value());
                }
                // Let global handlers see the submission as well
                false
            }
            _ => false,
        }
    }

    fn is_focusable(&self) -> bool {
        !self.disabled
    }

    fn cursor_offset(&self) -> Option<(u16, u16)> {
        if !self.focused {
            return None;
        }
        let col = self.cursor.saturating_sub(self.scroll);
        Some((col.min(u16::MAX as usize) as u16, 0))
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

impl Stateful for TextInput {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn save_state(&self) -> StateMap {
        StateMap::new()
            .with("value", self.value())
            .with("cursor", self.cursor as u64)
    }

    fn load_state(&mut self, state: &StateMap) -> Result<()> {
        if let Some(value) = state.get_str("value") {
            self.chars = value.chars().collect();
        }
        let cursor = state
            .get_u64("cursor")
            .map(|c| c as usize)
            .unwrap_or(self.chars.len());
        self.move_to(cursor);
        Ok(())
    }
}

impl PropsUpdater for TextInput {
    fn update_props(&mut self, fresh: &dyn Component) {
        let Some(fresh) = downcast_ref::<TextInput>(fresh) else {
            return;
        };
        self.id = fresh.id.clone();
        self.placeholder = fresh.placeholder.clone();
        self.disabled = fresh.disabled;
        self.on_change = fresh.on_change.clone();
        self.on_submit = fresh.on_submit.clone();
        if self.width != fresh.width {
            self.width = fresh.width;
            self.follow_cursor();
        }
    }
}
