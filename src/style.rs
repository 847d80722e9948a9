//! Style resolution: inline style maps to typed values.
//!
//! Unknown properties and unparseable values are ignored (the property keeps
//! its default). Text color and attributes inherit from the parent; box
//! properties never do.
//!
//! | property | values |
//! |---|---|
//! | `display` | `flex`, `none` |
//! | `flex-direction` | `column` (default), `row`, `column-reverse`, `row-reverse` |
//! | `flex-grow`, `flex-shrink` | number |
//! | `width`, `height`, `min-*`, `max-*` | `auto`, `N`, `N%` |
//! | `padding`, `margin` | 1, 2 or 4 cell counts; also `-top` etc. |
//! | `gap` | cells |
//! | `border` | `none`, `single`, `rounded`, `double`, `bold` |
//! | `border-color`, `color`, `background` | see [`Rgba::parse`] |
//! | `overflow` | `visible`, `hidden`, `scroll`, `auto` |
//! | `justify-content`, `align-items` | flexbox keywords |
//! | `font-weight`, `font-style`, `text-decoration` | `bold`, `italic`, `underline`, `line-through` |
//! | `bold`, `italic`, `underline`, `dim`, `inverse`, `strikethrough` | `true` / `false` |

use crate::element::Element;
use crate::types::{Attr, Rgba};

// =============================================================================
// VALUE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    Cells(u16),
    Percent(f32),
}

impl Dimension {
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v == "auto" {
            return Some(Self::Auto);
        }
        if let Some(p) = v.strip_suffix('%') {
            return p.trim().parse::<f32>().ok().map(Self::Percent);
        }
        v.parse::<u16>().ok().map(Self::Cells)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
    ColumnReverse,
    RowReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    /// Content is clipped to the box.
    pub fn clips(self) -> bool {
        !matches!(self, Self::Visible)
    }

    /// Content can be scrolled.
    pub fn scrolls(self) -> bool {
        matches!(self, Self::Scroll | Self::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Stretch,
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Single,
    Rounded,
    Double,
    Bold,
}

impl BorderStyle {
    /// Glyphs: `[horizontal, vertical, top-left, top-right, bottom-right, bottom-left]`.
    pub fn glyphs(self) -> Option<[char; 6]> {
        match self {
            Self::None => None,
            Self::Single => Some(['─', '│', '┌', '┐', '┘', '└']),
            Self::Rounded => Some(['─', '│', '╭', '╮', '╯', '╰']),
            Self::Double => Some(['═', '║', '╔', '╗', '╝', '╚']),
            Self::Bold => Some(['━', '┃', '┏', '┓', '┛', '┗']),
        }
    }

    pub fn width(self) -> u16 {
        if self == Self::None { 0 } else { 1 }
    }
}

/// Per-side cell counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Edges {
    pub const fn all(n: u16) -> Self {
        Self {
            top: n,
            right: n,
            bottom: n,
            left: n,
        }
    }

    /// CSS shorthand: `1`, `1 2` or `1 2 3 4`.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<u16> = value
            .split_whitespace()
            .map(|p| p.parse::<u16>().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [all] => Some(Self::all(*all)),
            [v, h] => Some(Self {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }),
            [top, right, bottom, left] => Some(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => None,
        }
    }

    fn set_side(&mut self, side: &str, value: u16) {
        match side {
            "top" => self.top = value,
            "right" => self.right = value,
            "bottom" => self.bottom = value,
            "left" => self.left = value,
            _ => {}
        }
    }
}

// =============================================================================
// RESOLVED STYLE
// =============================================================================

/// Typed style of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub hidden: bool,
    pub flex_direction: FlexDirection,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    pub padding: Edges,
    pub margin: Edges,
    pub gap: u16,
    pub border: BorderStyle,
    pub border_color: Option<Rgba>,
    pub justify_content: Justify,
    pub align_items: Align,
    pub overflow: Overflow,
    /// Inherited.
    pub color: Rgba,
    pub background: Option<Rgba>,
    /// Inherited.
    pub attrs: Attr,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            hidden: false,
            flex_direction: FlexDirection::Column,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            padding: Edges::default(),
            margin: Edges::default(),
            gap: 0,
            border: BorderStyle::None,
            border_color: None,
            justify_content: Justify::Start,
            align_items: Align::Stretch,
            overflow: Overflow::Visible,
            color: Rgba::TERMINAL_DEFAULT,
            background: None,
            attrs: Attr::NONE,
        }
    }
}

impl ResolvedStyle {
    /// Cells taken by border plus padding on each side.
    pub fn inset(&self) -> Edges {
        let b = self.border.width();
        Edges {
            top: b + self.padding.top,
            right: b + self.padding.right,
            bottom: b + self.padding.bottom,
            left: b + self.padding.left,
        }
    }
}

/// Default style carrying only what a child inherits from `parent`.
pub fn inherited(parent: Option<&ResolvedStyle>) -> ResolvedStyle {
    let mut style = ResolvedStyle::default();
    if let Some(parent) = parent {
        style.color = parent.color;
        style.attrs = parent.attrs;
    }
    style
}

/// Resolve `element`'s inline styles, inheriting text properties from `parent`.
pub fn resolve(element: &Element, parent: Option<&ResolvedStyle>) -> ResolvedStyle {
    let mut style = inherited(parent);
    for (name, value) in &element.styles {
        apply(&mut style, name, value.trim());
    }
    style
}

fn apply(style: &mut ResolvedStyle, name: &str, value: &str) {
    match name {
        "display" => style.hidden = value == "none",
        "flex-direction" => {
            if let Some(dir) = match value {
                "column" => Some(FlexDirection::Column),
                "row" => Some(FlexDirection::Row),
                "column-reverse" => Some(FlexDirection::ColumnReverse),
                "row-reverse" => Some(FlexDirection::RowReverse),
                _ => None,
            } {
                style.flex_direction = dir;
            }
        }
        "flex-grow" => set_parsed(&mut style.flex_grow, value.parse::<f32>().ok()),
        "flex-shrink" => set_parsed(&mut style.flex_shrink, value.parse::<f32>().ok()),
        "flex" => set_parsed(&mut style.flex_grow, value.split_whitespace().next().and_then(|v| v.parse().ok())),
        "width" => set_parsed(&mut style.width, Dimension::parse(value)),
        "height" => set_parsed(&mut style.height, Dimension::parse(value)),
        "min-width" => set_parsed(&mut style.min_width, Dimension::parse(value)),
        "min-height" => set_parsed(&mut style.min_height, Dimension::parse(value)),
        "max-width" => set_parsed(&mut style.max_width, Dimension::parse(value)),
        "max-height" => set_parsed(&mut style.max_height, Dimension::parse(value)),
        "padding" => set_parsed(&mut style.padding, Edges::parse(value)),
        "margin" => set_parsed(&mut style.margin, Edges::parse(value)),
        "gap" => set_parsed(&mut style.gap, value.parse().ok()),
        "border" | "border-style" => {
            if let Some(border) = match value {
                "none" => Some(BorderStyle::None),
                "single" | "solid" => Some(BorderStyle::Single),
                "rounded" | "round" => Some(BorderStyle::Rounded),
                "double" => Some(BorderStyle::Double),
                "bold" | "heavy" => Some(BorderStyle::Bold),
                _ => None,
            } {
                style.border = border;
            }
        }
        "border-color" => style.border_color = Rgba::parse(value).or(style.border_color),
        "justify-content" => {
            if let Some(j) = match value {
                "flex-start" | "start" => Some(Justify::Start),
                "center" => Some(Justify::Center),
                "flex-end" | "end" => Some(Justify::End),
                "space-between" => Some(Justify::SpaceBetween),
                "space-around" => Some(Justify::SpaceAround),
                "space-evenly" => Some(Justify::SpaceEvenly),
                _ => None,
            } {
                style.justify_content = j;
            }
        }
        "align-items" => {
            if let Some(a) = match value {
                "stretch" => Some(Align::Stretch),
                "flex-start" | "start" => Some(Align::Start),
                "center" => Some(Align::Center),
                "flex-end" | "end" => Some(Align::End),
                _ => None,
            } {
                style.align_items = a;
            }
        }
        "overflow" => {
            if let Some(o) = match value {
                "visible" => Some(Overflow::Visible),
                "hidden" => Some(Overflow::Hidden),
                "scroll" => Some(Overflow::Scroll),
                "auto" => Some(Overflow::Auto),
                _ => None,
            } {
                style.overflow = o;
            }
        }
        "color" => set_parsed(&mut style.color, Rgba::parse(value)),
        "background" | "background-color" => style.background = Rgba::parse(value).or(style.background),
        "font-weight" => style.attrs.set(Attr::BOLD, value == "bold"),
        "font-style" => style.attrs.set(Attr::ITALIC, value == "italic"),
        "text-decoration" => {
            style.attrs.set(Attr::UNDERLINE, value.contains("underline"));
            style.attrs.set(Attr::STRIKETHROUGH, value.contains("line-through"));
        }
        "bold" => style.attrs.set(Attr::BOLD, value == "true"),
        "dim" => style.attrs.set(Attr::DIM, value == "true"),
        "italic" => style.attrs.set(Attr::ITALIC, value == "true"),
        "underline" => style.attrs.set(Attr::UNDERLINE, value == "true"),
        "inverse" => style.attrs.set(Attr::INVERSE, value == "true"),
        "strikethrough" => style.attrs.set(Attr::STRIKETHROUGH, value == "true"),
        _ => {}
    }

    if let Some(side) = name.strip_prefix("padding-") {
        if let Ok(v) = value.parse() {
            style.padding.set_side(side, v);
        }
    } else if let Some(side) = name.strip_prefix("margin-") {
        if let Ok(v) = value.parse() {
            style.margin.set_side(side, v);
        }
    }
}

fn set_parsed<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
