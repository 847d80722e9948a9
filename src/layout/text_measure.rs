//! Text Measurement
//!
//! Utilities for measuring text dimensions in terminal cells.
//!
//! Terminal text width depends on Unicode character widths:
//! - ASCII characters: 1 cell
//! - CJK characters and most emoji: 2 cells
//! - Control and zero-width characters: 0 cells

use unicode_width::UnicodeWidthStr;

use crate::renderer::buffer::char_width;

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> u16 {
    s.width().min(u16::MAX as usize) as u16
}

/// Widest line of `text`, in cells.
pub fn max_line_width(text: &str) -> u16 {
    text.lines().map(string_width).max().unwrap_or(0)
}

/// Number of lines `text` occupies when wrapped to `available_width`.
///
/// Zero for empty text.
pub fn measure_text_height(text: &str, available_width: u16) -> u16 {
    wrap_text(text, available_width).len().min(u16::MAX as usize) as u16
}

/// Wrap text to `width` cells.
///
/// Breaks at the last space that fits when there is one, mid-word otherwise.
/// Explicit newlines always break. A wide character never straddles a line.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for source in text.split('\n') {
        wrap_line(source, width as usize, &mut lines);
    }
    lines
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_width = 0usize;
    // Byte offset in `current` just after the last space, and the width up to it
    let mut last_break: Option<(usize, usize)> = None;

    for c in line.chars() {
        let w = char_width(c);

        if current_width + w > width && !current.is_empty() {
            if c == ' ' {
                out.push(std::mem::take(&mut current));
                current_width = 0;
                last_break = None;
                continue;
            }
            match last_break {
                Some((at, at_width)) if at < current.len() => {
                    let rest = current.split_off(at);
                    out.push(current.trim_end().to_string());
                    current = rest;
                    current_width -= at_width;
                }
                _ => {
                    out.push(std::mem::take(&mut current));
                    current_width = 0;
                }
            }
            last_break = None;
        }

        current.push(c);
        current_width += w;
        if c == ' ' {
            last_break = Some((current.len(), current_width));
        }
    }

    out.push(current);
}
