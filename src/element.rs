//! Element Tree - the immutable snapshot produced by one render call.
//!
//! An application's render function returns a fresh [`Element`] tree every
//! frame. The tree is owned by the render cycle and discarded after use; the
//! only code that mutates it after construction is the reconciler (which
//! rewrites component subtrees) and the focus manager (which splices in
//! focus-aware output).
//!
//! # Structural paths
//!
//! Every node has a positional address: the root is `""`, its children are
//! `"0"`, `"1"`, ..., and their children `"0.0"`, `"0.1"`, and so on. A node
//! carrying a [`key`](Element::with_key) uses `#key` as its own segment instead
//! of its index, which keeps its identity stable when siblings are reordered.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentRef, type_name_of};

/// Inline style map (`"flex-grow" => "1"`, `"color" => "red"`, ...).
pub type Styles = BTreeMap<String, String>;

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// A box that lays out its children.
    Container,
    /// A run of text. Text nodes have no children.
    Text(String),
    /// A component wrapper. After reconciliation its single child is the
    /// output of the live instance in [`Element::component`].
    Component,
}

/// One node of a per-frame UI tree.
#[derive(Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub styles: Styles,
    pub children: Vec<Element>,
    /// Only set for [`ElementKind::Component`] nodes.
    pub component: Option<ComponentRef>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub key: Option<String>,
}

impl Element {
    fn with_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            styles: Styles::new(),
            children: Vec::new(),
            component: None,
            id: None,
            classes: Vec::new(),
            key: None,
        }
    }

    /// An empty container.
    pub fn container() -> Self {
        Self::with_kind(ElementKind::Container)
    }

    /// A text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(ElementKind::Text(content.into()))
    }

    /// Wrap a freshly constructed component instance.
    ///
    /// The instance is not rendered here; the reconciler renders whichever
    /// instance ends up owning this position.
    pub fn component<C: Component>(instance: C) -> Self {
        Self::component_ref(Rc::new(RefCell::new(instance)))
    }

    /// Wrap an existing shared instance.
    pub fn component_ref(instance: ComponentRef) -> Self {
        let mut element = Self::with_kind(ElementKind::Component);
        element.component = Some(instance);
        element
    }

    /// A visible placeholder substituted for a subtree that failed to build.
    pub fn error(message: impl Into<String>) -> Self {
        Self::text(format!("⚠ {}", message.into()))
            .styled("color", "red")
            .with_class("error")
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn styled(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(name.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    /// Text content for text nodes.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn style_value(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    /// `display: none` removes the node and its subtree from the frame.
    pub fn is_hidden(&self) -> bool {
        self.style_value("display").map(str::trim) == Some("none")
    }

    /// All text in this subtree, concatenated in pre-order.
    pub fn collect_text(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |node, _| {
            if let Some(text) = node.text_content() {
                out.push_str(text);
            }
        });
        out
    }

    /// Pre-order traversal with structural paths.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Element, &str),
    {
        self.walk_from("", f);
    }

    /// Pre-order traversal starting at a known path.
    pub fn walk_from<F>(&self, path: &str, f: &mut F)
    where
        F: FnMut(&Element, &str),
    {
        f(self, path);
        for (child, child_path) in self.children.iter().zip(self.child_paths_at(path)) {
            child.walk_from(&child_path, f);
        }
    }

    /// Find the node at `path`.
    pub fn node_at(&self, path: &str) -> Option<&Element> {
        let mut node = self;
        for segment in split_path(path) {
            let idx = resolve_segment(&node.children, segment)?;
            node = &node.children[idx];
        }
        Some(node)
    }

    /// Find the node at `path`, mutably.
    pub fn node_at_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut node = self;
        for segment in split_path(path) {
            let idx = resolve_segment(&node.children, segment)?;
            node = &mut node.children[idx];
        }
        Some(node)
    }

    /// Paths of this node's children, given this node's own path.
    ///
    /// A wrapper's output is always addressed as `P.0`, whatever its key.
    pub fn child_paths_at(&self, path: &str) -> Vec<String> {
        if self.is_component() {
            (0..self.children.len())
                .map(|i| join_path(path, &i.to_string()))
                .collect()
        } else {
            child_paths(path, &self.children)
        }
    }

    /// The live component at `path`, if that node is a wrapper.
    pub fn component_at(&self, path: &str) -> Option<ComponentRef> {
        self.node_at(path).and_then(|n| n.component.clone())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("kind", &self.kind);
        if !self.styles.is_empty() {
            s.field("styles", &self.styles);
        }
        if let Some(component) = &self.component {
            s.field("component", &type_name_of(component));
        }
        if let Some(id) = &self.id {
            s.field("id", id);
        }
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        if !self.children.is_empty() {
            s.field("children", &self.children);
        }
        s.finish()
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// Join a parent path and a child segment.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

fn resolve_segment(children: &[Element], segment: &str) -> Option<usize> {
    if let Some(key) = segment.strip_prefix('#') {
        children.iter().position(|c| c.key.as_deref() == Some(key))
    } else {
        segment.parse::<usize>().ok().filter(|&i| i < children.len())
    }
}

/// Path segments for each child: `#key` for the first sibling carrying a
/// given key, the positional index otherwise. Keys containing `.` cannot be
/// addressed and also fall back to the index.
pub fn child_segments(children: &[Element]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    children
        .iter()
        .enumerate()
        .map(|(i, child)| match child.key.as_deref() {
            Some(key) if !key.is_empty() && !key.contains('.') && seen.insert(key) => {
                format!("#{key}")
            }
            _ => i.to_string(),
        })
        .collect()
}

/// Full child paths under `parent`.
pub fn child_paths(parent: &str, children: &[Element]) -> Vec<String> {
    child_segments(children)
        .iter()
        .map(|seg| join_path(parent, seg))
        .collect()
}

/// Keys that appear on more than one sibling.
pub fn duplicate_keys(children: &[Element]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut dupes = Vec::new();
    for key in children.iter().filter_map(|c| c.key.as_deref()) {
        if !seen.insert(key) && !dupes.contains(&key) {
            dupes.push(key);
        }
    }
    dupes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::container()
            .child(Element::text("a"))
            .child(
                Element::container()
                    .child(Element::text("b"))
                    .child(Element::text("c")),
            )
    }

    #[test]
    fn test_paths_are_dot_separated_indices() {
        let mut paths = Vec::new();
        sample().walk(&mut |_, path| paths.push(path.to_string()));
        assert_eq!(paths, vec!["", "0", "1", "1.0", "1.1"]);
    }

    #[test]
    fn test_node_at() {
        let tree = sample();
        assert_eq!(tree.node_at("1.1").and_then(|n| n.text_content()), Some("c"));
        assert_eq!(tree.node_at("0").and_then(|n| n.text_content()), Some("a"));
        assert!(tree.node_at("2").is_none());
        assert!(tree.node_at("0.0").is_none());
        assert!(tree.node_at("").is_some());
    }

    #[test]
    fn test_keyed_segments() {
        let children = vec![
            Element::text("x").with_key("x"),
            Element::text("plain"),
            Element::text("y").with_key("y"),
        ];
        assert_eq!(child_segments(&children), vec!["#x", "1", "#y"]);

        let tree = Element::container().with_children(children);
        assert_eq!(tree.node_at("#y").and_then(|n| n.text_content()), Some("y"));
    }

    #[test]
    fn test_duplicate_keys_fall_back_to_index() {
        let children = vec![
            Element::text("a").with_key("k"),
            Element::text("b").with_key("k"),
        ];
        assert_eq!(child_segments(&children), vec!["#k", "1"]);
        assert_eq!(duplicate_keys(&children), vec!["k"]);
    }

    #[test]
    fn test_wrapper_output_ignores_key() {
        let mut wrapper = Element::component(Fixed);
        wrapper.children = vec![Element::text("out").with_key("k")];
        assert_eq!(wrapper.child_paths_at("3"), vec!["3.0"]);
    }

    struct Fixed;

    impl Component for Fixed {
        fn render(&self) -> Element {
            Element::text("out")
        }
    }

    #[test]
    fn test_collect_text() {
        assert_eq!(sample().collect_text(), "abc");
    }

    #[test]
    fn test_error_placeholder() {
        let el = Element::error("boom");
        assert_eq!(el.text_content(), Some("⚠ boom"));
        assert_eq!(el.style_value("color"), Some("red"));
    }
}
