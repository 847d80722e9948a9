//! Taffy Bridge - Integration with Taffy layout engine
//!
//! Converts resolved styles to Taffy styles, runs layout computation,
//! and extracts absolute geometry into a [`LayoutBox`] tree.

use taffy::prelude::*;
use taffy::{
    Dimension as TaffyDimension, FlexDirection as TaffyFlexDirection,
    Overflow as TaffyOverflow, Point,
};

use super::LayoutBox;
use super::text_measure::{max_line_width, string_width, wrap_text};
use crate::element::{Element, ElementKind};
use crate::error::Result;
use crate::style::{
    self, Align, Dimension, Edges, FlexDirection, Justify, Overflow, ResolvedStyle,
};

// =============================================================================
// TYPE CONVERSIONS
// =============================================================================

fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Cells(n) => TaffyDimension::Length(n as f32),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

fn to_taffy_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_justify_content(justify: Justify) -> JustifyContent {
    match justify {
        Justify::Start => JustifyContent::FlexStart,
        Justify::Center => JustifyContent::Center,
        Justify::End => JustifyContent::FlexEnd,
        Justify::SpaceBetween => JustifyContent::SpaceBetween,
        Justify::SpaceAround => JustifyContent::SpaceAround,
        Justify::SpaceEvenly => JustifyContent::SpaceEvenly,
    }
}

fn to_taffy_align_items(align: Align) -> AlignItems {
    match align {
        Align::Stretch => AlignItems::Stretch,
        Align::Start => AlignItems::FlexStart,
        Align::Center => AlignItems::Center,
        Align::End => AlignItems::FlexEnd,
    }
}

fn to_taffy_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Clip,
        // Auto acts like scroll when content overflows
        Overflow::Scroll | Overflow::Auto => TaffyOverflow::Scroll,
    }
}

fn lengths(edges: Edges) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(edges.top as f32),
        right: LengthPercentage::Length(edges.right as f32),
        bottom: LengthPercentage::Length(edges.bottom as f32),
        left: LengthPercentage::Length(edges.left as f32),
    }
}

/// Build a Taffy Style from a resolved style.
fn build_style(resolved: &ResolvedStyle) -> Style {
    let margin = resolved.margin;
    let overflow = to_taffy_overflow(resolved.overflow);

    Style {
        display: Display::Flex,

        flex_direction: to_taffy_flex_direction(resolved.flex_direction),
        justify_content: Some(to_taffy_justify_content(resolved.justify_content)),
        align_items: Some(to_taffy_align_items(resolved.align_items)),

        flex_grow: resolved.flex_grow,
        flex_shrink: resolved.flex_shrink,

        size: Size {
            width: to_taffy_dimension(resolved.width),
            height: to_taffy_dimension(resolved.height),
        },
        min_size: Size {
            width: to_taffy_dimension(resolved.min_width),
            height: to_taffy_dimension(resolved.min_height),
        },
        max_size: Size {
            width: to_taffy_dimension(resolved.max_width),
            height: to_taffy_dimension(resolved.max_height),
        },

        margin: Rect {
            top: LengthPercentageAuto::Length(margin.top as f32),
            right: LengthPercentageAuto::Length(margin.right as f32),
            bottom: LengthPercentageAuto::Length(margin.bottom as f32),
            left: LengthPercentageAuto::Length(margin.left as f32),
        },
        padding: lengths(resolved.padding),
        // Border is just the width; glyphs and color are painted later
        border: lengths(Edges::all(resolved.border.width())),
        gap: Size {
            width: LengthPercentage::Length(resolved.gap as f32),
            height: LengthPercentage::Length(resolved.gap as f32),
        },

        overflow: Point {
            x: overflow,
            y: overflow,
        },
        scrollbar_width: 0.0,

        ..Default::default()
    }
}

// =============================================================================
// TEXT MEASUREMENT
// =============================================================================

/// Measure function for text content.
fn measure_text(
    content: &str,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    if content.is_empty() {
        return Size::ZERO;
    }

    let natural = max_line_width(content);
    let wrap_at = match known_dimensions.width {
        Some(w) => w.max(0.0) as u16,
        None => match available_space.width {
            AvailableSpace::Definite(w) => (w.max(0.0) as u16).min(natural),
            AvailableSpace::MinContent => content
                .split_whitespace()
                .map(string_width)
                .max()
                .unwrap_or(0),
            AvailableSpace::MaxContent => natural,
        },
    };

    let lines = wrap_text(content, wrap_at.max(1));
    let width = lines.iter().map(|l| string_width(l)).max().unwrap_or(0);

    Size {
        width: known_dimensions.width.unwrap_or(width as f32),
        height: known_dimensions.height.unwrap_or(lines.len() as f32),
    }
}

// =============================================================================
// TREE BUILDING
// =============================================================================

/// A node inserted into the Taffy tree, waiting for geometry.
struct Pending {
    path: String,
    node: NodeId,
    style: ResolvedStyle,
    text: Option<String>,
    scroll_key: Option<String>,
    is_wrapper: bool,
    shares_node: bool,
    children: Vec<Pending>,
}

struct Builder<'a> {
    taffy: TaffyTree<String>,
    scroll_region: Option<&'a str>,
}

impl Builder<'_> {
    fn build(
        &mut self,
        element: &Element,
        path: &str,
        parent: Option<&ResolvedStyle>,
    ) -> Result<Option<Pending>> {
        if element.is_component() {
            return self.build_wrapper(element, path, parent);
        }

        let mut resolved = style::resolve(element, parent);
        if resolved.hidden {
            return Ok(None);
        }
        if self.scroll_region == Some(path) && !resolved.overflow.scrolls() {
            resolved.overflow = Overflow::Scroll;
        }
        let scroll_key = resolved
            .overflow
            .scrolls()
            .then(|| super::scroll_key(element, path));

        let taffy_style = build_style(&resolved);
        let (node, text, children) = match &element.kind {
            ElementKind::Text(content) => {
                let node = self.taffy.new_leaf_with_context(taffy_style, content.clone())?;
                (node, Some(content.clone()), Vec::new())
            }
            _ => {
                let mut children = Vec::with_capacity(element.children.len());
                for (child, child_path) in element.children.iter().zip(element.child_paths_at(path)) {
                    if let Some(built) = self.build(child, &child_path, Some(&resolved))? {
                        children.push(built);
                    }
                }
                let ids: Vec<NodeId> = children.iter().map(|c| c.node).collect();
                (self.taffy.new_with_children(taffy_style, &ids)?, None, children)
            }
        };

        Ok(Some(Pending {
            path: path.to_string(),
            node,
            style: resolved,
            text,
            scroll_key,
            is_wrapper: false,
            shares_node: false,
            children,
        }))
    }

    /// Unstyled wrappers share their output's Taffy node. A wrapper carrying
    /// styles of its own (or chosen as the scroll region) becomes a real box
    /// around its output.
    fn build_wrapper(
        &mut self,
        element: &Element,
        path: &str,
        parent: Option<&ResolvedStyle>,
    ) -> Result<Option<Pending>> {
        let is_region = self.scroll_region == Some(path);
        let styled = !element.styles.is_empty() || is_region;
        let mut resolved = if styled {
            style::resolve(element, parent)
        } else {
            style::inherited(parent)
        };
        if resolved.hidden {
            return Ok(None);
        }
        if is_region && !resolved.overflow.scrolls() {
            resolved.overflow = Overflow::Scroll;
        }
        let scroll_key = resolved
            .overflow
            .scrolls()
            .then(|| super::scroll_key(element, path));

        let mut children = Vec::new();
        for (child, child_path) in element.children.iter().zip(element.child_paths_at(path)) {
            if let Some(built) = self.build(child, &child_path, Some(&resolved))? {
                children.push(built);
            }
        }

        let shares_node = !styled && children.len() == 1;
        let node = if shares_node {
            children[0].node
        } else {
            let ids: Vec<NodeId> = children.iter().map(|c| c.node).collect();
            let taffy_style = if styled { build_style(&resolved) } else { Style::default() };
            self.taffy.new_with_children(taffy_style, &ids)?
        };

        Ok(Some(Pending {
            path: path.to_string(),
            node,
            style: resolved,
            text: None,
            scroll_key,
            is_wrapper: true,
            shares_node,
            children,
        }))
    }

    /// Read geometry back out. `origin` is the absolute position of the
    /// Taffy parent's border box.
    fn extract(&self, pending: Pending, origin: (i32, i32)) -> Result<LayoutBox> {
        let layout = self.taffy.layout(pending.node)?;
        let x = origin.0 + layout.location.x.round() as i32;
        let y = origin.1 + layout.location.y.round() as i32;
        let width = layout.size.width.round().max(0.0) as u16;
        let height = layout.size.height.round().max(0.0) as u16;

        let child_origin = if pending.shares_node { origin } else { (x, y) };
        let children = pending
            .children
            .into_iter()
            .map(|c| self.extract(c, child_origin))
            .collect::<Result<Vec<_>>>()?;

        let inset = pending.style.inset();
        let content_x = x + inset.left as i32;
        let content_y = y + inset.top as i32;
        let mut content_width = 0i32;
        let mut content_height = 0i32;
        for child in &children {
            let m = child.style.margin;
            content_width = content_width.max(child.x + child.width as i32 + m.right as i32 - content_x);
            content_height = content_height.max(child.y + child.height as i32 + m.bottom as i32 - content_y);
        }

        Ok(LayoutBox {
            path: pending.path,
            x,
            y,
            width,
            height,
            content_width: content_width.clamp(0, u16::MAX as i32) as u16,
            content_height: content_height.clamp(0, u16::MAX as i32) as u16,
            style: pending.style,
            text: pending.text,
            scroll_key: pending.scroll_key,
            is_wrapper: pending.is_wrapper,
            boxed: !pending.shares_node,
            children,
        })
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Lay out a reconciled Element tree on a `width` x `height` terminal.
///
/// The root fills the terminal unless it declares its own size. The node at
/// `scroll_region` is treated as a scroll container even without an
/// `overflow` style.
pub fn compute_layout(
    tree: &Element,
    width: u16,
    height: u16,
    scroll_region: Option<&str>,
) -> Result<LayoutBox> {
    let mut builder = Builder {
        taffy: TaffyTree::new(),
        scroll_region,
    };

    let root = match builder.build(tree, "", None)? {
        Some(root) => root,
        None => {
            // Hidden root: an empty screen
            let node = builder.taffy.new_leaf(Style::default())?;
            Pending {
                path: String::new(),
                node,
                style: ResolvedStyle::default(),
                text: None,
                scroll_key: None,
                is_wrapper: false,
                shares_node: false,
                children: Vec::new(),
            }
        }
    };

    let mut root_style = builder.taffy.style(root.node)?.clone();
    if root_style.size.width == TaffyDimension::Auto {
        root_style.size.width = TaffyDimension::Length(width as f32);
    }
    if root_style.size.height == TaffyDimension::Auto {
        root_style.size.height = TaffyDimension::Length(height as f32);
    }
    builder.taffy.set_style(root.node, root_style)?;

    let available = Size {
        width: AvailableSpace::Definite(width as f32),
        height: AvailableSpace::Definite(height as f32),
    };

    builder.taffy.compute_layout_with_measure(
        root.node,
        available,
        |known_dimensions: Size<Option<f32>>,
         available_space: Size<AvailableSpace>,
         _node_id: NodeId,
         context: Option<&mut String>,
         _style: &Style| {
            match context {
                Some(content) => measure_text(content, known_dimensions, available_space),
                None => Size::ZERO,
            }
        },
    )?;

    builder.extract(root, (0, 0))
}
