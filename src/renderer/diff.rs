//! Differential renderer.
//!
//! Compares the current frame to the previous one and emits only the cells
//! that changed, grouped into horizontal runs so each run costs one cursor
//! move. With no previous frame, or when the size changed, the whole frame is
//! emitted instead.
//!
//! # Algorithm
//!
//! 1. Collect dirty runs (full rows on a full render)
//! 2. If nothing changed and the cursor did not move: emit nothing
//! 3. Otherwise wrap the output in a synchronized block and write each run
//!    with [`StatefulCellRenderer`], carrying pen state across runs
//! 4. Place (or hide) the hardware cursor
//! 5. Store the current frame as previous for the next comparison

use std::io;

use super::ansi;
use super::buffer::FrameBuffer;
use super::output::{OutputBuffer, StatefulCellRenderer};

// =============================================================================
// Dirty runs
// =============================================================================

/// A maximal horizontal span of changed cells: `x_start..x_end` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRun {
    pub y: u16,
    pub x_start: u16,
    pub x_end: u16,
}

impl DirtyRun {
    pub fn len(&self) -> usize {
        (self.x_end - self.x_start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.x_end == self.x_start
    }
}

/// Dirty runs between two frames, or `None` if they cannot be diffed
/// (no previous frame, or different dimensions).
pub fn dirty_runs(previous: Option<&FrameBuffer>, current: &FrameBuffer) -> Option<Vec<DirtyRun>> {
    let previous = previous.filter(|p| p.same_size(current))?;
    let mut runs = Vec::new();

    for y in 0..current.height() {
        let old = previous.row(y);
        let new = current.row(y);
        let mut x = 0usize;
        while x < new.len() {
            if old[x] == new[x] {
                x += 1;
                continue;
            }
            let mut start = x;
            // Redraw the head of a wide char whose right half changed.
            if new[start].char == 0 && start > 0 {
                start -= 1;
            }
            while x < new.len() && old[x] != new[x] {
                x += 1;
            }
            runs.push(DirtyRun {
                y,
                x_start: start as u16,
                x_end: x as u16,
            });
        }
    }

    Some(runs)
}

fn full_runs(buffer: &FrameBuffer) -> Vec<DirtyRun> {
    if buffer.width() == 0 {
        return Vec::new();
    }
    (0..buffer.height())
        .map(|y| DirtyRun {
            y,
            x_start: 0,
            x_end: buffer.width(),
        })
        .collect()
}

// =============================================================================
// DiffRenderer
// =============================================================================

/// What one `render` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Whole frame emitted (first frame, resize or invalidate).
    pub full: bool,
    pub dirty_cells: usize,
    pub runs: usize,
    pub bytes: usize,
}

/// Keeps the previous frame and turns new frames into minimal output.
#[derive(Debug)]
pub struct DiffRenderer {
    output: OutputBuffer,
    cell_renderer: StatefulCellRenderer,
    previous: Option<FrameBuffer>,
    /// Cursor as last emitted: `None` = hidden.
    cursor: Option<(u16, u16)>,
    /// Whether the hardware cursor state has been emitted at least once.
    cursor_known: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            cell_renderer: StatefulCellRenderer::new(),
            previous: None,
            cursor: None,
            cursor_known: false,
        }
    }

    /// Render a frame, emitting only what changed since the previous one.
    ///
    /// Returns the bytes to write to the terminal (empty if nothing changed).
    pub fn render(
        &mut self,
        buffer: &FrameBuffer,
        cursor: Option<(u16, u16)>,
    ) -> io::Result<(Vec<u8>, FrameStats)> {
        let (runs, full) = match dirty_runs(self.previous.as_ref(), buffer) {
            Some(runs) => (runs, false),
            None => (full_runs(buffer), true),
        };

        let cursor = cursor.filter(|&(x, y)| buffer.in_bounds(x, y));
        let cursor_changed = !self.cursor_known || cursor != self.cursor;
        let mut stats = FrameStats {
            full,
            dirty_cells: runs.iter().map(DirtyRun::len).sum(),
            runs: runs.len(),
            bytes: 0,
        };

        if runs.is_empty() && !cursor_changed {
            self.previous = Some(buffer.clone());
            return Ok((Vec::new(), stats));
        }

        self.output.clear();
        ansi::begin_sync(&mut self.output)?;
        self.cell_renderer.reset();

        for run in &runs {
            for x in run.x_start..run.x_end {
                if let Some(cell) = buffer.get(x, run.y) {
                    self.cell_renderer
                        .render_cell(&mut self.output, x, run.y, cell)?;
                }
            }
        }

        // Drawing moves the hardware cursor, so a visible cursor is placed
        // again after any cell output.
        match cursor {
            Some((x, y)) => {
                if cursor_changed || !runs.is_empty() {
                    ansi::cursor_to(&mut self.output, x, y)?;
                }
                if !self.cursor_known || self.cursor.is_none() {
                    ansi::cursor_show(&mut self.output)?;
                }
            }
            None => {
                if !self.cursor_known || self.cursor.is_some() {
                    ansi::cursor_hide(&mut self.output)?;
                }
            }
        }
        self.cursor = cursor;
        self.cursor_known = true;

        ansi::end_sync(&mut self.output)?;

        self.previous = Some(buffer.clone());
        let bytes = self.output.take();
        stats.bytes = bytes.len();
        tracing::trace!(
            full = stats.full,
            dirty = stats.dirty_cells,
            runs = stats.runs,
            bytes = stats.bytes,
            "frame diffed"
        );
        Ok((bytes, stats))
    }

    /// Invalidate the previous frame. Next render will be a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
        self.cursor_known = false;
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn previous(&self) -> Option<&FrameBuffer> {
        self.previous.as_ref()
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
