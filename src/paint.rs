//! Paint a laid-out frame into a [`FrameBuffer`].
//!
//! Boxes are painted in pre-order: background, border, text, then children
//! clipped to the content box. Scroll containers shift their children by the
//! offset stored in the [`ScrollManager`] and draw a scrollbar on their right
//! edge when content overflows.

use std::collections::HashMap;

use crate::layout::{LayoutBox, wrap_text};
use crate::renderer::buffer::{FrameBuffer, rect_to_clip};
use crate::state::scroll::{ScrollManager, ScrollState};
use crate::types::{Attr, ClipRect, Rgba};

const SCROLLBAR_TRACK: char = '│';
const SCROLLBAR_THUMB: char = '┃';

/// Where a box ended up on screen after scrolling, and the clip it was drawn
/// under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenOrigin {
    pub x: i32,
    pub y: i32,
    pub clip: ClipRect,
}

impl ScreenOrigin {
    /// Translate an offset within the box to a visible screen cell.
    pub fn place(&self, dx: u16, dy: u16) -> Option<(u16, u16)> {
        let x = self.x + dx as i32;
        let y = self.y + dy as i32;
        if x < 0 || y < 0 || x > u16::MAX as i32 || y > u16::MAX as i32 {
            return None;
        }
        let (x, y) = (x as u16, y as u16);
        self.clip.contains(x, y).then_some((x, y))
    }
}

/// Screen origins of every painted component wrapper, by path.
pub type Origins = HashMap<String, ScreenOrigin>;

/// Paint `root` into `buffer`, which is cleared first.
pub fn paint(root: &LayoutBox, buffer: &mut FrameBuffer, scroll: &ScrollManager) -> Origins {
    buffer.clear();
    let mut origins = Origins::new();
    let clip = buffer.bounds();
    paint_box(buffer, root, scroll, &clip, (0, 0), &mut origins);
    origins
}

/// Paint one box. `shift` is the accumulated scroll offset of its ancestors.
fn paint_box(
    buffer: &mut FrameBuffer,
    node: &LayoutBox,
    scroll: &ScrollManager,
    parent_clip: &ClipRect,
    shift: (i32, i32),
    origins: &mut Origins,
) {
    let x = node.x - shift.0;
    let y = node.y - shift.1;

    if node.is_wrapper && !node.boxed {
        origins.insert(
            node.path.clone(),
            ScreenOrigin {
                x,
                y,
                clip: *parent_clip,
            },
        );
        for child in &node.children {
            paint_box(buffer, child, scroll, parent_clip, shift, origins);
        }
        return;
    }

    if node.width == 0 || node.height == 0 {
        return;
    }
    let Some(clip) = rect_to_clip(x, y, node.width, node.height).and_then(|r| r.intersect(parent_clip))
    else {
        return;
    };

    let style = &node.style;
    if let Some(bg) = style.background {
        buffer.fill_rect(x, y, node.width, node.height, bg, &clip);
    }
    if let Some(glyphs) = style.border.glyphs() {
        let color = style.border_color.unwrap_or(style.color);
        buffer.draw_border(x, y, node.width, node.height, glyphs, color, &clip);
    }

    let inset = style.inset();
    let content_x = x + inset.left as i32;
    let content_y = y + inset.top as i32;
    let (inner_w, inner_h) = (node.inner_width(), node.inner_height());
    let Some(content_clip) = rect_to_clip(content_x, content_y, inner_w, inner_h).and_then(|r| r.intersect(&clip))
    else {
        return;
    };

    if let Some(text) = &node.text {
        for (row, line) in wrap_text(text, inner_w).iter().enumerate() {
            buffer.draw_text(
                content_x,
                content_y + row as i32,
                line,
                style.color,
                style.background,
                style.attrs,
                &content_clip,
            );
        }
    }

    let child_clip = if style.overflow.clips() { content_clip } else { *parent_clip };
    let (child_shift, scroll_state) = match node.scroll_key.as_deref().and_then(|k| scroll.get(k)) {
        Some(state) => (
            (shift.0 + state.offset_x as i32, shift.1 + state.offset_y as i32),
            Some(state),
        ),
        None => (shift, None),
    };

    if node.is_wrapper {
        let (out_x, out_y) = node
            .children
            .first()
            .map_or((content_x, content_y), |out| (out.x - child_shift.0, out.y - child_shift.1));
        origins.insert(
            node.path.clone(),
            ScreenOrigin {
                x: out_x,
                y: out_y,
                clip: child_clip,
            },
        );
    }

    for child in &node.children {
        paint_box(buffer, child, scroll, &child_clip, child_shift, origins);
    }

    if let Some(state) = scroll_state {
        let bar_x = x + node.width as i32 - 1 - style.border.width() as i32;
        let bar_y = y + style.border.width() as i32;
        let bar_h = node.height.saturating_sub(style.border.width() * 2);
        paint_scrollbar(buffer, state, bar_x, bar_y, bar_h, style.color, &clip);
    }
}

/// Track and thumb on the right edge, only while content overflows.
fn paint_scrollbar(
    buffer: &mut FrameBuffer,
    state: &ScrollState,
    x: i32,
    y: i32,
    height: u16,
    color: Rgba,
    clip: &ClipRect,
) {
    let max = state.max_y();
    if max == 0 || height == 0 {
        return;
    }

    let total = state.content_height.max(1) as f32;
    let thumb = ((height as f32 * height as f32 / total).round() as u16).clamp(1, height);
    let travel = (height - thumb) as f32;
    let thumb_top = (state.offset_y as f32 / max as f32 * travel).round() as u16;

    for row in 0..height {
        let on_thumb = row >= thumb_top && row < thumb_top + thumb;
        let (glyph, attrs) = if on_thumb {
            (SCROLLBAR_THUMB, Attr::NONE)
        } else {
            (SCROLLBAR_TRACK, Attr::DIM)
        };
        buffer.set_cell(x, y + row as i32, glyph as u32, color, None, attrs, clip);
    }
}
