//! Global Keys Module - app-wide key bindings
//!
//! [`KeyBindings`] is an explicit registry handed to the runtime at startup,
//! so two runtimes never share shortcuts and tests can build their own.
//! Bindings are tried in registration order; the first handler that returns
//! `true` consumes the key.
//!
//! # Example
//!
//! ```
//! use retui::state::global_keys::{KeyBindings, Trigger};
//! use retui::state::keyboard::KeyEvent;
//! use retui::context::AppContext;
//!
//! let mut bindings = KeyBindings::new();
//! let id = bindings.on(Trigger::ctrl('o'), |_, ctx| {
//!     ctx.request_render();
//!     true
//! });
//!
//! let ctx = AppContext::new();
//! assert!(bindings.dispatch(&KeyEvent::from_byte(15), &ctx));
//! assert!(!bindings.dispatch(&KeyEvent::char('o'), &ctx));
//!
//! bindings.remove(id);
//! assert!(bindings.is_empty());
//! ```

use super::keyboard::{KeyCode, KeyEvent, Modifier};
use crate::context::AppContext;

// =============================================================================
// TRIGGER
// =============================================================================

/// What a binding matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A raw input byte. `Ctrl+A..Z` are bytes 1..26.
    Byte(u8),
    /// An exact key chord.
    Key(KeyCode, Modifier),
    /// A raw escape sequence, compared against [`KeyEvent::raw`].
    Escape(String),
}

impl Trigger {
    pub fn ctrl(c: char) -> Self {
        Self::Key(KeyCode::Char(c.to_ascii_lowercase()), Modifier::CTRL)
    }

    pub fn alt(c: char) -> Self {
        Self::Key(KeyCode::Char(c), Modifier::ALT)
    }

    pub fn key(code: KeyCode) -> Self {
        Self::Key(code, Modifier::NONE)
    }

    /// Parse `"ctrl+o"`, `"alt+1"`, `"shift+tab"`, `"f5"`, `"x"`.
    pub fn parse(combo: &str) -> Option<Self> {
        let mut modifiers = Modifier::NONE;
        let mut parts: Vec<&str> = combo.split('+').collect();
        let key = parts.pop()?;
        for part in parts {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => Modifier::CTRL,
                "alt" | "meta" => Modifier::ALT,
                "shift" => Modifier::SHIFT,
                "super" | "cmd" => Modifier::SUPER,
                _ => return None,
            };
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Escape,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "insert" => KeyCode::Insert,
            "space" => KeyCode::Char(' '),
            lower => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        let n = lower.strip_prefix('f')?.parse::<u8>().ok()?;
                        KeyCode::F(n)
                    }
                }
            }
        };

        let event = KeyEvent::with_modifiers(code, modifiers);
        let (code, modifiers) = event.normalized();
        Some(Self::Key(code, modifiers))
    }

    /// Whether `event` fires this trigger.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match self {
            Self::Byte(b) => event.to_byte() == Some(*b),
            Self::Key(code, modifiers) => {
                let probe = KeyEvent::with_modifiers(code.clone(), *modifiers);
                probe.normalized() == event.normalized()
            }
            Self::Escape(seq) => event.raw.as_deref() == Some(seq.as_str()),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Handle returned by [`KeyBindings::on`], used to remove a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

type Handler = Box<dyn FnMut(&KeyEvent, &AppContext) -> bool>;

struct Binding {
    id: BindingId,
    trigger: Trigger,
    handler: Handler,
}

/// Registry of app-wide shortcuts.
#[derive(Default)]
pub struct KeyBindings {
    bindings: Vec<Binding>,
    next_id: u64,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns `true` from the handler to consume the key.
    pub fn on<F>(&mut self, trigger: Trigger, handler: F) -> BindingId
    where
        F: FnMut(&KeyEvent, &AppContext) -> bool + 'static,
    {
        let id = BindingId(self.next_id);
        self.next_id += 1;
        self.bindings.push(Binding {
            id,
            trigger,
            handler: Box::new(handler),
        });
        id
    }

    pub fn remove(&mut self, id: BindingId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.id != id);
        self.bindings.len() != before
    }

    /// Try bindings in registration order. Returns `true` if one consumed it.
    pub fn dispatch(&mut self, event: &KeyEvent, ctx: &AppContext) -> bool {
        for binding in &mut self.bindings {
            if binding.trigger.matches(event) && (binding.handler)(event, ctx) {
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Debug for KeyBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| &b.trigger))
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
