//! Focus System - keyboard focus across rebuilt trees
//!
//! The focusable set is recomputed from every reconciled frame, in pre-order.
//! [`FocusManager::rebuild`] keeps the same logical widget focused across
//! that churn: it remembers the focused entry's stable id (and its index) and
//! looks for it again in the new list.
//!
//! Resolution order after a rebuild:
//! 1. an id requested through [`FocusManager::focus_id`] that was not yet
//!    mounted
//! 2. the id of the previously focused entry
//! 3. the previous index, if still in bounds
//! 4. index 0
//!
//! An entry's id is its [`Stateful::id`](crate::component::Stateful::id),
//! falling back to the wrapper element's `id`.

use crate::component::{ComponentRef, render_isolated};
use crate::element::{Element, join_path};
use crate::reconcile::Reconciler;

// =============================================================================
// FOCUS ENTRY
// =============================================================================

/// One focusable component in the current frame.
#[derive(Clone)]
pub struct FocusEntry {
    /// Structural path of the wrapper node.
    pub path: String,
    pub component: ComponentRef,
    pub id: Option<String>,
}

impl std::fmt::Debug for FocusEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusEntry")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish()
    }
}

// =============================================================================
// FOCUS MANAGER
// =============================================================================

#[derive(Debug, Default)]
pub struct FocusManager {
    focusables: Vec<FocusEntry>,
    focus_index: Option<usize>,
    preferred_id: Option<String>,
    preferred_index: Option<usize>,
    /// Requested through `focus_id` before the target was mounted.
    pending_id: Option<String>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile `tree`, recollect focusables and restore focus.
    ///
    /// Focus-dependent output is re-rendered and spliced back into the tree,
    /// so the returned frame reflects the final focus state.
    pub fn rebuild(&mut self, tree: &mut Element, reconciler: &mut Reconciler) {
        let previous_path = self.focused().map(|e| e.path.clone());
        self.preferred_id = self.focused().and_then(|e| e.id.clone());
        self.preferred_index = self.focus_index;

        reconciler.reconcile(tree);

        self.focusables = collect_focusables(tree);
        self.focus_index = self.resolve_index();

        let current_path = self.focused().map(|e| e.path.as_str());
        if current_path != previous_path.as_deref() {
            tracing::debug!(from = ?previous_path, to = ?current_path, "focus resolved");
        }

        self.push_focus_state();
        self.splice_focus_output(tree, reconciler);
    }

    fn resolve_index(&mut self) -> Option<usize> {
        if self.focusables.is_empty() {
            return None;
        }

        if let Some(pending) = &self.pending_id {
            if let Some(i) = self.position_of(pending) {
                self.pending_id = None;
                return Some(i);
            }
        }

        if let Some(id) = self.preferred_id.as_deref().filter(|id| !id.is_empty()) {
            if let Some(i) = self.position_of(id) {
                return Some(i);
            }
        }

        match self.preferred_index {
            Some(i) if i < self.focusables.len() => Some(i),
            _ => Some(0),
        }
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.focusables
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
    }

    /// Tell every focusable whether it holds focus.
    fn push_focus_state(&self) {
        for (i, entry) in self.focusables.iter().enumerate() {
            let Ok(mut guard) = entry.component.try_borrow_mut() else {
                tracing::warn!(path = %entry.path, "component busy, focus state not pushed");
                continue;
            };
            if let Some(focusable) = guard.focusable() {
                focusable.set_focused(self.focus_index == Some(i));
            }
        }
    }

    /// Re-render each focusable and replace its output in `tree`.
    fn splice_focus_output(&self, tree: &mut Element, reconciler: &mut Reconciler) {
        for entry in &self.focusables {
            let Some(node) = tree.node_at_mut(&entry.path) else {
                continue;
            };
            let mut output = render_isolated(&entry.component);
            let child_path = join_path(&entry.path, "0");
            reconciler.reconcile_subtree(&mut output, &child_path);
            node.children = vec![output];
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Move focus forward, wrapping. Returns false on an empty list.
    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    /// Move focus backward, wrapping.
    pub fn previous(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, direction: isize) -> bool {
        let len = self.focusables.len();
        if len == 0 {
            return false;
        }
        let current = self.focus_index.unwrap_or(0) as isize;
        let next = (current + direction).rem_euclid(len as isize) as usize;
        self.set_index(next);
        true
    }

    /// Focus the entry at `index`.
    pub fn focus_index_at(&mut self, index: usize) -> bool {
        if index >= self.focusables.len() {
            return false;
        }
        self.set_index(index);
        true
    }

    /// Focus the entry with `id`. If none is mounted yet, the request is
    /// remembered and applied by the next rebuild that finds it.
    pub fn focus_id(&mut self, id: &str) -> bool {
        match self.position_of(id) {
            Some(i) => {
                self.pending_id = None;
                self.set_index(i);
                true
            }
            None => {
                self.pending_id = Some(id.to_string());
                false
            }
        }
    }

    fn set_index(&mut self, index: usize) {
        if self.focus_index != Some(index) {
            tracing::debug!(
                from = ?self.focus_index,
                to = index,
                path = %self.focusables[index].path,
                "focus moved"
            );
        }
        self.focus_index = Some(index);
        self.push_focus_state();
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn focus_index(&self) -> Option<usize> {
        self.focus_index
    }

    pub fn focused(&self) -> Option<&FocusEntry> {
        self.focus_index.and_then(|i| self.focusables.get(i))
    }

    pub fn focused_component(&self) -> Option<ComponentRef> {
        self.focused().map(|e| e.component.clone())
    }

    pub fn entries(&self) -> &[FocusEntry] {
        &self.focusables
    }

    pub fn len(&self) -> usize {
        self.focusables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.focusables.is_empty()
    }
}

/// Pre-order list of wrappers whose component is currently focusable.
/// Hidden subtrees are skipped.
fn collect_focusables(tree: &Element) -> Vec<FocusEntry> {
    let mut out = Vec::new();
    collect_into(tree, "", &mut out);
    out
}

fn collect_into(node: &Element, path: &str, out: &mut Vec<FocusEntry>) {
    if node.is_hidden() {
        return;
    }
    if let Some(component) = &node.component {
        if let Ok(mut guard) = component.try_borrow_mut() {
            if guard.focusable().is_some_and(|f| f.is_focusable()) {
                let id = guard
                    .stateful()
                    .map(|s| s.id())
                    .filter(|id| !id.is_empty())
                    .or_else(|| node.id.clone());
                out.push(FocusEntry {
                    path: path.to_string(),
                    component: component.clone(),
                    id,
                });
            }
        }
    }
    for (child, child_path) in node.children.iter().zip(node.child_paths_at(path)) {
        collect_into(child, &child_path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Focusable, Stateful, downcast_ref};
    use crate::context::AppContext;
    use crate::error::Result;
    use crate::session::StateMap;
    use crate::state::keyboard::KeyEvent;
    use proptest::prelude::*;

    struct Field {
        id: Option<&'static str>,
        focused: bool,
        enabled: bool,
    }

    impl Field {
        fn new(id: Option<&'static str>) -> Self {
            Self {
                id,
                focused: false,
                enabled: true,
            }
        }
    }

    impl Component for Field {
        fn render(&self) -> Element {
            Element::text(if self.focused { "[x]" } else { "[ ]" })
        }

        fn focusable(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }

        fn stateful(&mut self) -> Option<&mut dyn Stateful> {
            if self.id.is_none() {
                return None;
            }
            Some(self)
        }
    }

    impl Focusable for Field {
        fn handle_key(&mut self, _: &KeyEvent, _: &AppContext) -> bool {
            false
        }

        fn is_focusable(&self) -> bool {
            self.enabled
        }

        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }
    }

    impl Stateful for Field {
        fn id(&self) -> String {
            self.id.unwrap_or_default().to_string()
        }

        fn save_state(&self) -> StateMap {
            StateMap::new()
        }

        fn load_state(&mut self, _: &StateMap) -> Result<()> {
            Ok(())
        }
    }

    fn ids(ids: &[&'static str]) -> Element {
        Element::container().with_children(
            ids.iter()
                .map(|id| Element::component(Field::new(Some(*id))).with_key(*id)),
        )
    }

    fn anonymous(n: usize) -> Element {
        Element::container()
            .with_children((0..n).map(|_| Element::component(Field::new(None))))
    }

    fn focused_id(focus: &FocusManager) -> Option<String> {
        focus.focused().and_then(|e| e.id.clone())
    }

    #[test]
    fn test_empty_tree_has_no_focus() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        focus.rebuild(&mut Element::container(), &mut r);
        assert_eq!(focus.focus_index(), None);
        assert!(!focus.next());
    }

    #[test]
    fn test_first_frame_focuses_index_zero() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        let mut tree = anonymous(3);
        focus.rebuild(&mut tree, &mut r);
        assert_eq!(focus.focus_index(), Some(0));
        assert_eq!(tree.collect_text(), "[x][ ][ ]");
    }

    #[test]
    fn test_focus_follows_id_across_reorder() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();

        focus.rebuild(&mut ids(&["a", "b", "c"]), &mut r);
        focus.next();
        assert_eq!(focused_id(&focus).as_deref(), Some("b"));

        focus.rebuild(&mut ids(&["c", "b", "a"]), &mut r);
        assert_eq!(focused_id(&focus).as_deref(), Some("b"));

        focus.rebuild(&mut ids(&["b", "a", "c"]), &mut r);
        assert_eq!(focused_id(&focus).as_deref(), Some("b"));
        assert_eq!(focus.focus_index(), Some(0));
    }

    #[test]
    fn test_index_fallback_without_ids() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();

        focus.rebuild(&mut anonymous(3), &mut r);
        focus.next();
        focus.next();
        assert_eq!(focus.focus_index(), Some(2));

        focus.rebuild(&mut anonymous(3), &mut r);
        assert_eq!(focus.focus_index(), Some(2));

        focus.rebuild(&mut anonymous(2), &mut r);
        assert_eq!(focus.focus_index(), Some(0));
    }

    #[test]
    fn test_hidden_subtrees_leave_tab_order() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        let mut tree = Element::container()
            .child(Element::component(Field::new(Some("a"))))
            .child(
                Element::container()
                    .styled("display", "none")
                    .child(Element::component(Field::new(Some("b")))),
            )
            .child(Element::component(Field::new(Some("c"))).styled("display", "none"))
            .child(Element::component(Field::new(Some("d"))));

        focus.rebuild(&mut tree, &mut r);
        assert_eq!(focus.len(), 2);
        focus.next();
        assert_eq!(focused_id(&focus).as_deref(), Some("d"));
        focus.next();
        assert_eq!(focused_id(&focus).as_deref(), Some("a"));
    }

    #[test]
    fn test_element_id_is_fallback_identity() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        let tree = |order: [&'static str; 2]| {
            Element::container().with_children(order.map(|id| {
                Element::component(Field::new(None)).with_id(id).with_key(id)
            }))
        };

        focus.rebuild(&mut tree(["x", "y"]), &mut r);
        focus.next();
        focus.rebuild(&mut tree(["y", "x"]), &mut r);
        assert_eq!(focused_id(&focus).as_deref(), Some("y"));
    }

    #[test]
    fn test_disabled_widgets_leave_tab_order() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        let mut tree = anonymous(3);
        focus.rebuild(&mut tree, &mut r);
        assert_eq!(focus.len(), 3);

        let middle = tree.component_at("1").expect("component");
        {
            let mut guard = middle.borrow_mut();
            let c: &mut dyn Component = &mut *guard;
            if let Some(field) = c.as_any_mut().downcast_mut::<Field>() {
                field.enabled = false;
            }
        }

        focus.rebuild(&mut anonymous(3), &mut r);
        assert_eq!(focus.len(), 2);
        assert_eq!(focus.entries()[1].path, "2");
    }

    #[test]
    fn test_previous_wraps() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        focus.rebuild(&mut anonymous(3), &mut r);
        assert!(focus.previous());
        assert_eq!(focus.focus_index(), Some(2));
    }

    #[test]
    fn test_focus_state_pushed_and_spliced() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        focus.rebuild(&mut anonymous(2), &mut r);
        focus.next();

        let mut tree = anonymous(2);
        focus.rebuild(&mut tree, &mut r);
        assert_eq!(tree.collect_text(), "[ ][x]");

        let second = focus.focused_component().expect("focused");
        let guard = second.borrow();
        let field = downcast_ref::<Field>(&*guard).expect("field");
        assert!(field.focused);
    }

    #[test]
    fn test_focus_id_applies_when_mounted() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        focus.rebuild(&mut ids(&["a"]), &mut r);

        assert!(!focus.focus_id("later"));
        focus.rebuild(&mut ids(&["a", "later"]), &mut r);
        assert_eq!(focused_id(&focus).as_deref(), Some("later"));

        assert!(focus.focus_id("a"));
        assert_eq!(focus.focus_index(), Some(0));
    }

    #[test]
    fn test_focus_index_at_bounds() {
        let mut focus = FocusManager::new();
        let mut r = Reconciler::default();
        focus.rebuild(&mut anonymous(2), &mut r);
        assert!(focus.focus_index_at(1));
        assert!(!focus.focus_index_at(2));
        assert_eq!(focus.focus_index(), Some(1));
    }

    proptest! {
        #[test]
        fn prop_next_len_times_returns_home(len in 1usize..12, start in 0usize..12) {
            let mut focus = FocusManager::new();
            let mut r = Reconciler::default();
            focus.rebuild(&mut anonymous(len), &mut r);
            focus.focus_index_at(start % len);
            let home = focus.focus_index();
            for _ in 0..len {
                focus.next();
            }
            prop_assert_eq!(focus.focus_index(), home);
        }
    }
}
