//! Keyboard Module - key event types
//!
//! [`KeyEvent`] is the one event type every layer of the router sees. It can
//! be built from a decoded terminal event or from a raw input byte, and it
//! maps back to the byte form (`Ctrl+A..Z` = 1..26) that key bindings are
//! commonly written in.
//!
//! # Example
//!
//! ```
//! use retui::state::keyboard::{KeyCode, KeyEvent, Modifier};
//!
//! let ctrl_o = KeyEvent::from_byte(15);
//! assert!(ctrl_o.is_ctrl('o'));
//! assert_eq!(ctrl_o.to_byte(), Some(15));
//!
//! let tab = KeyEvent::new(KeyCode::Tab);
//! assert_eq!(tab.to_byte(), Some(9));
//! assert_eq!(KeyEvent::with_modifiers(KeyCode::Tab, Modifier::SHIFT).to_byte(), None);
//! ```

// =============================================================================
// TYPES
// =============================================================================

/// Key code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
    Null,
}

bitflags::bitflags! {
    /// Keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifier: u8 {
        const NONE  = 0;
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Key event state (press, repeat, release)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifier,
    pub state: KeyState,
    /// Raw escape sequence, when the driver knows it.
    pub raw: Option<String>,
}

impl KeyEvent {
    /// A plain key press.
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifier::NONE,
            state: KeyState::Press,
            raw: None,
        }
    }

    pub fn with_modifiers(code: KeyCode, modifiers: Modifier) -> Self {
        Self {
            modifiers,
            ..Self::new(code)
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::with_modifiers(KeyCode::Char(c.to_ascii_lowercase()), Modifier::CTRL)
    }

    pub fn alt(c: char) -> Self {
        Self::with_modifiers(KeyCode::Char(c), Modifier::ALT)
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_state(mut self, state: KeyState) -> Self {
        self.state = state;
        self
    }

    /// Decode a single raw input byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::new(KeyCode::Null),
            9 => Self::new(KeyCode::Tab),
            10 | 13 => Self::new(KeyCode::Enter),
            27 => Self::new(KeyCode::Escape),
            127 | 8 => Self::new(KeyCode::Backspace),
            1..=26 => Self::ctrl((b'a' + byte - 1) as char),
            _ => Self::char(byte as char),
        }
    }

    /// The byte a terminal would send for this key, if it has one.
    pub fn to_byte(&self) -> Option<u8> {
        let mods = self.modifiers - Modifier::SHIFT;
        match (&self.code, mods) {
            (KeyCode::Char(c), m) if m == Modifier::CTRL && c.is_ascii_alphabetic() => {
                Some(c.to_ascii_lowercase() as u8 - b'a' + 1)
            }
            (KeyCode::Char(c), Modifier::NONE) if c.is_ascii() => Some(*c as u8),
            (KeyCode::Tab, Modifier::NONE) if !self.modifiers.contains(Modifier::SHIFT) => Some(9),
            (KeyCode::Enter, Modifier::NONE) => Some(13),
            (KeyCode::Escape, Modifier::NONE) => Some(27),
            (KeyCode::Backspace, Modifier::NONE) => Some(127),
            (KeyCode::Null, _) => Some(0),
            _ => None,
        }
    }

    /// Canonical form used for binding comparison: Ctrl letters lowercased,
    /// Shift dropped from printable characters (the char already carries it).
    pub fn normalized(&self) -> (KeyCode, Modifier) {
        match &self.code {
            KeyCode::Char(c) if self.modifiers.contains(Modifier::CTRL) => (
                KeyCode::Char(c.to_ascii_lowercase()),
                self.modifiers - Modifier::SHIFT,
            ),
            KeyCode::Char(c) => (KeyCode::Char(*c), self.modifiers - Modifier::SHIFT),
            other => (other.clone(), self.modifiers),
        }
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Press
    }

    /// An unmodified (or shifted) printable character.
    pub fn is_char(&self, c: char) -> bool {
        self.code == KeyCode::Char(c)
            && !self.modifiers.intersects(Modifier::CTRL | Modifier::ALT | Modifier::SUPER)
    }

    pub fn is_ctrl(&self, c: char) -> bool {
        self.normalized() == (KeyCode::Char(c.to_ascii_lowercase()), Modifier::CTRL)
    }

    /// Plain printable input (what a text field should insert).
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !c.is_control()
                    && !self
                        .modifiers
                        .intersects(Modifier::CTRL | Modifier::ALT | Modifier::SUPER) =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}
