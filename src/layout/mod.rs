//! Layout Module
//!
//! Flexbox layout computation for terminal UI using Taffy.
//!
//! # Architecture
//!
//! The layout module uses [Taffy](https://github.com/DioxusLabs/taffy) for
//! W3C-compliant flexbox computation. The bridge:
//!
//! 1. Resolves each Element's inline styles into a [`ResolvedStyle`]
//! 2. Builds a Taffy tree mirroring the Element tree
//! 3. Provides measure functions for text intrinsic sizing
//! 4. Extracts computed geometry into a [`LayoutBox`] tree with absolute positions
//!
//! Component wrappers are transparent: a wrapper's box shares the geometry of
//! its single output child.

mod taffy_bridge;
mod text_measure;

pub use taffy_bridge::compute_layout;
pub use text_measure::*;

use crate::element::Element;
use crate::style::ResolvedStyle;

// =============================================================================
// LAYOUT BOX
// =============================================================================

/// Absolute geometry of one laid-out node.
///
/// Positions are in terminal cells relative to the screen origin, before any
/// scroll offset is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    /// Structural path of the Element this box was built from.
    pub path: String,
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
    /// Extent of the children measured from the content box origin.
    pub content_width: u16,
    pub content_height: u16,
    pub style: ResolvedStyle,
    /// Text content for text nodes.
    pub text: Option<String>,
    /// Scroll state key for scroll containers (the element id, else its path).
    pub scroll_key: Option<String>,
    pub is_wrapper: bool,
    /// Whether this box has geometry of its own. Unstyled wrappers share
    /// their output's box and paint nothing themselves.
    pub boxed: bool,
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    /// Width of the content box (inside border and padding).
    pub fn inner_width(&self) -> u16 {
        let inset = self.style.inset();
        self.width.saturating_sub(inset.left + inset.right)
    }

    /// Height of the content box (inside border and padding).
    pub fn inner_height(&self) -> u16 {
        let inset = self.style.inset();
        self.height.saturating_sub(inset.top + inset.bottom)
    }

    /// Find the box for `path`.
    pub fn find(&self, path: &str) -> Option<&LayoutBox> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    /// Pre-order traversal.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&LayoutBox),
    {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

// =============================================================================
// SCROLL REGION
// =============================================================================

/// The region that arrow keys scroll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRegion {
    pub path: String,
    /// Key into the scroll manager.
    pub key: String,
}

/// Detect the scroll region of a frame.
///
/// The first node in pre-order declaring `overflow: auto` wins; failing that,
/// the first node with a non-zero `flex-grow`.
pub fn find_scroll_region(tree: &Element) -> Option<ScrollRegion> {
    let mut overflow_auto: Option<ScrollRegion> = None;
    let mut grows: Option<ScrollRegion> = None;

    tree.walk(&mut |node, path| {
        if overflow_auto.is_some() {
            return;
        }
        let region = || ScrollRegion {
            path: path.to_string(),
            key: scroll_key(node, path),
        };
        if node.style_value("overflow").map(str::trim) == Some("auto") {
            overflow_auto = Some(region());
        } else if grows.is_none() && grow_factor(node) > 0.0 {
            grows = Some(region());
        }
    });

    overflow_auto.or(grows)
}

/// Scroll state key for a node: its id, else its path.
pub fn scroll_key(node: &Element, path: &str) -> String {
    match node.id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => path.to_string(),
    }
}

fn grow_factor(node: &Element) -> f32 {
    node.style_value("flex-grow")
        .or_else(|| node.style_value("flex").and_then(|v| v.split_whitespace().next()))
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(0.0)
}
