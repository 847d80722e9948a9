//! Terminal driver.
//!
//! The runtime talks to the terminal only through the [`Terminal`] trait:
//! start and stop the session, report the size, write frame bytes and poll
//! for input. [`CrosstermTerminal`] drives a real TTY; [`MockTerminal`] keeps
//! everything in memory and replays what was written onto a character grid
//! so tests can assert on the visible screen.

use std::collections::VecDeque;
use std::io::{self, IsTerminal, Stdout, Write};
use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent,
    KeyEventKind, KeyModifiers,
};
use crossterm::terminal;

use crate::error::{Error, Result};
use crate::renderer::ansi;
use crate::renderer::buffer::char_width;
use crate::state::keyboard::{KeyCode, KeyEvent, KeyState, Modifier};

// =============================================================================
// INPUT EVENT
// =============================================================================

/// Unified input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// New width and height.
    Resize(u16, u16),
    /// No event or unhandled event type
    None,
}

// =============================================================================
// TERMINAL TRAIT
// =============================================================================

/// What the runtime needs from a terminal.
pub trait Terminal {
    /// Current size in cells.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Acquire the terminal. Fails with [`Error::NoTty`] when there is none.
    fn start(&mut self, alternate_screen: bool) -> Result<()>;

    /// Restore the terminal. Safe to call more than once.
    fn stop(&mut self) -> Result<()>;

    /// Write one frame's bytes and flush.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Wait up to `timeout` for an input event.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>>;
}

// =============================================================================
// CROSSTERM
// =============================================================================

/// A real terminal on stdout.
pub struct CrosstermTerminal {
    out: Stdout,
    started: bool,
    alternate_screen: bool,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            started: false,
            alternate_screen: false,
        }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn start(&mut self, alternate_screen: bool) -> Result<()> {
        if !self.out.is_terminal() {
            return Err(Error::NoTty);
        }
        terminal::enable_raw_mode()?;
        self.started = true;
        self.alternate_screen = alternate_screen;

        let mut out = self.out.lock();
        if alternate_screen {
            ansi::enter_alt_screen(&mut out)?;
        }
        ansi::cursor_hide(&mut out)?;
        ansi::clear_screen(&mut out)?;
        out.flush()?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;

        let mut out = self.out.lock();
        ansi::reset(&mut out)?;
        ansi::cursor_show(&mut out)?;
        if self.alternate_screen {
            ansi::exit_alt_screen(&mut out)?;
        }
        out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock();
        out.write_all(bytes)?;
        out.flush()
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(Some(match event::read()? {
            CrosstermEvent::Key(key) => InputEvent::Key(convert_key_event(key)),
            CrosstermEvent::Resize(w, h) => InputEvent::Resize(w, h),
            _ => InputEvent::None,
        }))
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "failed to restore terminal");
        }
    }
}

/// Convert crossterm's KeyEvent to ours.
pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyEvent {
    let mut modifiers = convert_modifiers(event.modifiers);
    let code = match event.code {
        CrosstermKeyCode::Char(c) if modifiers.contains(Modifier::CTRL) => {
            KeyCode::Char(c.to_ascii_lowercase())
        }
        CrosstermKeyCode::Char(c) => KeyCode::Char(c),
        CrosstermKeyCode::Enter => KeyCode::Enter,
        CrosstermKeyCode::Tab => KeyCode::Tab,
        CrosstermKeyCode::BackTab => {
            modifiers |= Modifier::SHIFT;
            KeyCode::Tab
        }
        CrosstermKeyCode::Backspace => KeyCode::Backspace,
        CrosstermKeyCode::Delete => KeyCode::Delete,
        CrosstermKeyCode::Esc => KeyCode::Escape,
        CrosstermKeyCode::Up => KeyCode::Up,
        CrosstermKeyCode::Down => KeyCode::Down,
        CrosstermKeyCode::Left => KeyCode::Left,
        CrosstermKeyCode::Right => KeyCode::Right,
        CrosstermKeyCode::Home => KeyCode::Home,
        CrosstermKeyCode::End => KeyCode::End,
        CrosstermKeyCode::PageUp => KeyCode::PageUp,
        CrosstermKeyCode::PageDown => KeyCode::PageDown,
        CrosstermKeyCode::Insert => KeyCode::Insert,
        CrosstermKeyCode::F(n) => KeyCode::F(n),
        _ => KeyCode::Null,
    };

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    KeyEvent::with_modifiers(code, modifiers).with_state(state)
}

fn convert_modifiers(mods: KeyModifiers) -> Modifier {
    let mut out = Modifier::NONE;
    if mods.contains(KeyModifiers::SHIFT) {
        out |= Modifier::SHIFT;
    }
    if mods.contains(KeyModifiers::ALT) {
        out |= Modifier::ALT;
    }
    if mods.contains(KeyModifiers::CONTROL) {
        out |= Modifier::CTRL;
    }
    if mods.contains(KeyModifiers::SUPER) {
        out |= Modifier::SUPER;
    }
    out
}

// =============================================================================
// MOCK
// =============================================================================

/// In-memory terminal for tests.
///
/// Every write is kept, and cursor moves, screen clears and printable
/// characters are replayed onto a grid. Style sequences are ignored.
#[derive(Debug)]
pub struct MockTerminal {
    width: u16,
    height: u16,
    tty: bool,
    started: bool,
    events: VecDeque<InputEvent>,
    writes: Vec<Vec<u8>>,
    screen: Vec<char>,
    cursor: (u16, u16),
}

impl MockTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            tty: true,
            started: false,
            events: VecDeque::new(),
            writes: Vec::new(),
            screen: vec![' '; width as usize * height as usize],
            cursor: (0, 0),
        }
    }

    /// A terminal whose `start` fails as if stdout were redirected.
    pub fn without_tty(mut self) -> Self {
        self.tty = false;
        self
    }

    /// Queue a key press.
    pub fn push_key(&mut self, key: KeyEvent) {
        self.events.push_back(InputEvent::Key(key));
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Change the reported size. The visible grid is reset, like a real
    /// terminal reflowing on resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = vec![' '; width as usize * height as usize];
        self.cursor = (0, 0);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Every write since creation, one entry per call.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&[u8]> {
        self.writes.last().map(Vec::as_slice)
    }

    /// Visible characters of row `y`, wide-character tails omitted.
    pub fn screen_row(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        self.screen[start..start + self.width as usize]
            .iter()
            .filter(|&&c| c != '\0')
            .collect()
    }

    /// The whole visible screen, rows joined with newlines and right-trimmed.
    pub fn screen_text(&self) -> String {
        (0..self.height)
            .map(|y| self.screen_row(y).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn replay(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '\x1b' {
                self.put(c);
                continue;
            }
            if chars.peek() != Some(&'[') {
                continue;
            }
            chars.next();

            let mut params = String::new();
            let mut final_byte = None;
            for p in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&p) {
                    final_byte = Some(p);
                    break;
                }
                params.push(p);
            }

            match final_byte {
                Some('H') => {
                    let mut parts = params.split(';').map(|p| p.parse::<u16>().unwrap_or(1));
                    let row = parts.next().unwrap_or(1).max(1);
                    let col = parts.next().unwrap_or(1).max(1);
                    self.cursor = (col - 1, row - 1);
                }
                Some('J') if params == "2" => self.screen.fill(' '),
                _ => {}
            }
        }
    }

    fn put(&mut self, c: char) {
        let w = char_width(c);
        if w == 0 {
            return;
        }
        let (x, y) = self.cursor;
        if x < self.width && y < self.height {
            let i = y as usize * self.width as usize + x as usize;
            self.screen[i] = c;
            if w == 2 && x + 1 < self.width {
                self.screen[i + 1] = '\0';
            }
        }
        self.cursor.0 = x.saturating_add(w as u16);
    }
}

impl Terminal for MockTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn start(&mut self, _alternate_screen: bool) -> Result<()> {
        if !self.tty {
            return Err(Error::NoTty);
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.replay(bytes);
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn poll_event(&mut self, _timeout: Duration) -> io::Result<Option<InputEvent>> {
        Ok(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_ctrl_char() {
        let key = convert_key_event(CrosstermKeyEvent::new(
            CrosstermKeyCode::Char('O'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ));
        assert!(key.is_ctrl('o'));
    }

    #[test]
    fn test_convert_backtab() {
        let key = convert_key_event(CrosstermKeyEvent::new(
            CrosstermKeyCode::BackTab,
            KeyModifiers::SHIFT,
        ));
        assert_eq!(key.code, KeyCode::Tab);
        assert!(key.modifiers.contains(Modifier::SHIFT));
    }

    #[test]
    fn test_convert_release() {
        let mut raw = CrosstermKeyEvent::new(CrosstermKeyCode::Char('a'), KeyModifiers::NONE);
        raw.kind = KeyEventKind::Release;
        assert_eq!(convert_key_event(raw).state, KeyState::Release);
    }

    #[test]
    fn test_mock_replays_cursor_moves() {
        let mut term = MockTerminal::new(6, 2);
        term.write(b"\x1b[2;3Hab\x1b[1mc\x1b[1;1Hz").expect("write");
        assert_eq!(term.screen_row(0), "z     ");
        assert_eq!(term.screen_row(1), "  abc ");
        term.write(b"\x1b[2J").expect("write");
        assert_eq!(term.screen_text(), "\n");
        assert_eq!(term.writes().len(), 2);
    }

    #[test]
    fn test_mock_without_tty() {
        let mut term = MockTerminal::new(10, 5).without_tty();
        assert!(matches!(term.start(true), Err(Error::NoTty)));
        assert!(!term.is_started());
    }

    #[test]
    fn test_mock_event_queue() {
        let mut term = MockTerminal::new(10, 5);
        term.push_key(KeyEvent::char('x'));
        term.push_event(InputEvent::Resize(20, 10));
        let wait = Duration::from_millis(1);
        assert_eq!(term.poll_event(wait).expect("poll"), Some(InputEvent::Key(KeyEvent::char('x'))));
        assert_eq!(term.poll_event(wait).expect("poll"), Some(InputEvent::Resize(20, 10)));
        assert_eq!(term.poll_event(wait).expect("poll"), None);
    }
}
