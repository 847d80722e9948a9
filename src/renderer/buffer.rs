//! FrameBuffer and drawing primitives.
//!
//! A FrameBuffer is a 2D grid of Cells that represents what should be displayed
//! on the terminal. Flat `Vec<Cell>` storage, row-major: `index = y * width + x`.
//!
//! Wide characters occupy two cells; the second holds `char == 0` as a
//! continuation marker.

use unicode_width::UnicodeWidthChar;

use crate::types::{Attr, Cell, ClipRect, Rgba};

// =============================================================================
// FrameBuffer
// =============================================================================

/// A 2D buffer of terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a new buffer filled with default cells.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Same width and height as `other`.
    #[inline]
    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// The full buffer bounds as a ClipRect.
    #[inline]
    pub fn bounds(&self) -> ClipRect {
        ClipRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Get a cell reference (None if out of bounds).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Get a mutable cell reference (None if out of bounds).
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// One row of cells.
    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = self.index(0, y);
        &self.cells[start..start + self.width as usize]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire buffer to default cells.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Resize the buffer (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::default(); width as usize * height as usize];
    }

    /// The text of one row, continuation cells skipped. Handy in tests.
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .iter()
            .filter(|c| c.char != 0)
            .filter_map(|c| char::from_u32(c.char))
            .collect()
    }

    // =========================================================================
    // Drawing Primitives
    // =========================================================================

    /// Set a single cell if it lies inside both the buffer and `clip`.
    ///
    /// `bg: None` keeps the cell's current background.
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        char: u32,
        fg: Rgba,
        bg: Option<Rgba>,
        attrs: Attr,
        clip: &ClipRect,
    ) -> bool {
        if x < 0 || y < 0 || x > u16::MAX as i32 || y > u16::MAX as i32 {
            return false;
        }
        let (x, y) = (x as u16, y as u16);
        if !clip.contains(x, y) {
            return false;
        }
        let Some(cell) = self.get_mut(x, y) else {
            return false;
        };

        cell.char = char;
        cell.fg = fg;
        if let Some(bg) = bg {
            cell.bg = bg;
        }
        cell.attrs = attrs;
        true
    }

    /// Fill a rectangle with a background color, clearing its text.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u16, height: u16, bg: Rgba, clip: &ClipRect) {
        let Some(area) = rect_to_clip(x, y, width, height).and_then(|r| r.intersect(clip)) else {
            return;
        };
        let Some(area) = area.intersect(&self.bounds()) else {
            return;
        };

        for row in area.y..area.y + area.height {
            let start = self.index(area.x, row);
            let end = start + area.width as usize;
            for cell in &mut self.cells[start..end] {
                *cell = Cell {
                    bg,
                    ..Cell::default()
                };
            }
        }
    }

    /// Draw text starting at (x, y), which may be off-screen to the left.
    ///
    /// Returns the number of columns advanced (handles wide characters).
    pub fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: Rgba,
        bg: Option<Rgba>,
        attrs: Attr,
        clip: &ClipRect,
    ) -> u16 {
        let mut col = x;

        for ch in text.chars() {
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if col >= self.width as i32 {
                break;
            }

            // A wide char only draws if both halves fit.
            let fits = w == 1 || (in_clip(clip, col + 1, y) && col + 1 < self.width as i32);
            if fits && self.set_cell(col, y, ch as u32, fg, bg, attrs, clip) && w == 2 {
                self.set_cell(col + 1, y, 0, fg, bg, attrs, clip);
            }

            col += w as i32;
        }

        (col - x).clamp(0, u16::MAX as i32) as u16
    }

    /// Draw a box border with the given glyphs `[h, v, tl, tr, br, bl]`.
    pub fn draw_border(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        glyphs: [char; 6],
        color: Rgba,
        clip: &ClipRect,
    ) {
        if width < 2 || height < 2 {
            return;
        }
        let [h, v, tl, tr, br, bl] = glyphs;
        let x2 = x + width as i32 - 1;
        let y2 = y + height as i32 - 1;

        self.set_cell(x, y, tl as u32, color, None, Attr::NONE, clip);
        self.set_cell(x2, y, tr as u32, color, None, Attr::NONE, clip);
        self.set_cell(x2, y2, br as u32, color, None, Attr::NONE, clip);
        self.set_cell(x, y2, bl as u32, color, None, Attr::NONE, clip);

        for col in (x + 1)..x2 {
            self.set_cell(col, y, h as u32, color, None, Attr::NONE, clip);
            self.set_cell(col, y2, h as u32, color, None, Attr::NONE, clip);
        }
        for row in (y + 1)..y2 {
            self.set_cell(x, row, v as u32, color, None, Attr::NONE, clip);
            self.set_cell(x2, row, v as u32, color, None, Attr::NONE, clip);
        }
    }
}

/// Convert a possibly off-screen rect into an on-screen ClipRect.
pub fn rect_to_clip(x: i32, y: i32, width: u16, height: u16) -> Option<ClipRect> {
    let x1 = x.max(0);
    let y1 = y.max(0);
    let x2 = (x + width as i32).min(u16::MAX as i32);
    let y2 = (y + height as i32).min(u16::MAX as i32);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(ClipRect::new(
        x1 as u16,
        y1 as u16,
        (x2 - x1) as u16,
        (y2 - y1) as u16,
    ))
}

fn in_clip(clip: &ClipRect, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x <= u16::MAX as i32 && y <= u16::MAX as i32 && clip.contains(x as u16, y as u16)
}

/// Display width of a character in cells. Control characters are 0.
#[inline]
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
