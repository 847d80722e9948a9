//! Reconciler - restores live component identity in a freshly built tree.
//!
//! The application's render function constructs new component instances
//! every frame. The reconciler walks that tree, looks each wrapper up in a
//! [`ComponentCache`] keyed by `(concrete type, structural path)`, and swaps
//! in the long-lived instance so state survives the rebuild.
//!
//! Wrapper nodes are not rendered when they are built. The reconciler renders
//! whichever instance wins the lookup (cached on a hit, the fresh one on a
//! miss) exactly once, stores the output as the wrapper's single child and
//! continues the walk inside it.
//!
//! # Cache bounds
//!
//! Every hit or insert stamps the entry with the current frame number. After
//! a pass, entries idle longer than [`CachePolicy::max_idle_frames`] are
//! evicted, then the least recently seen entries are dropped until the cache
//! fits [`CachePolicy::max_entries`]. Entries seen in the current frame are
//! never evicted, and an orphan always survives at least one further frame.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{
    Component, ComponentRef, render_isolated, short_type_name, type_id_of, type_name_of,
};
use crate::element::{Element, duplicate_keys};

// =============================================================================
// CACHE
// =============================================================================

/// Identity of one component position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub type_id: TypeId,
    pub path: String,
}

impl CacheKey {
    pub fn new(type_id: TypeId, path: impl Into<String>) -> Self {
        Self {
            type_id,
            path: path.into(),
        }
    }

    /// Key for concrete type `T` at `path`.
    pub fn of<T: Component>(path: impl Into<String>) -> Self {
        Self::new(TypeId::of::<T>(), path)
    }
}

/// Eviction limits for [`ComponentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Evict entries not seen for more than this many frames.
    pub max_idle_frames: Option<u64>,
    /// Soft cap on entry count; only entries idle this frame are dropped.
    pub max_entries: Option<usize>,
}

impl CachePolicy {
    /// Never evict.
    pub const fn unbounded() -> Self {
        Self {
            max_idle_frames: None,
            max_entries: None,
        }
    }

    pub fn with_max_idle_frames(mut self, frames: Option<u64>) -> Self {
        self.max_idle_frames = frames;
        self
    }

    pub fn with_max_entries(mut self, entries: Option<usize>) -> Self {
        self.max_entries = entries;
        self
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_idle_frames: Some(300),
            max_entries: Some(10_000),
        }
    }
}

struct CacheEntry {
    component: ComponentRef,
    last_seen: u64,
}

/// Long-lived component instances by [`CacheKey`].
pub struct ComponentCache {
    entries: HashMap<CacheKey, CacheEntry>,
    policy: CachePolicy,
    frame: u64,
}

impl ComponentCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            frame: 0,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&ComponentRef> {
        self.entries.get(key).map(|e| &e.component)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Look up `key`, stamping it as seen. Returns the cached instance.
    fn touch(&mut self, key: &CacheKey) -> Option<ComponentRef> {
        let frame = self.frame;
        self.entries.get_mut(key).map(|entry| {
            entry.last_seen = frame;
            entry.component.clone()
        })
    }

    fn insert(&mut self, key: CacheKey, component: ComponentRef) {
        let last_seen = self.frame;
        self.entries.insert(
            key,
            CacheEntry {
                component,
                last_seen,
            },
        );
    }

    fn seen_this_frame(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.last_seen == self.frame)
    }

    /// Apply the policy. Returns how many entries were dropped.
    fn evict(&mut self) -> usize {
        let before = self.entries.len();
        let frame = self.frame;

        if let Some(max_idle) = self.policy.max_idle_frames {
            let max_idle = max_idle.max(1);
            self.entries
                .retain(|_, e| frame.saturating_sub(e.last_seen) <= max_idle);
        }

        if let Some(max_entries) = self.policy.max_entries {
            if self.entries.len() > max_entries {
                let mut idle: Vec<(u64, CacheKey)> = self
                    .entries
                    .iter()
                    .filter(|(_, e)| frame.saturating_sub(e.last_seen) > 1)
                    .map(|(k, e)| (e.last_seen, k.clone()))
                    .collect();
                idle.sort_by_key(|(seen, _)| *seen);

                let excess = self.entries.len() - max_entries;
                for (_, key) in idle.into_iter().take(excess) {
                    self.entries.remove(&key);
                }
            }
        }

        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "component cache evicted");
        }
        evicted
    }
}

impl Default for ComponentCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl std::fmt::Debug for ComponentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCache")
            .field("entries", &self.entries.len())
            .field("frame", &self.frame)
            .field("policy", &self.policy)
            .finish()
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Counters from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub hits: usize,
    pub misses: usize,
    pub evicted: usize,
}

/// Maps fresh wrapper nodes back onto long-lived instances.
#[derive(Debug, Default)]
pub struct Reconciler {
    cache: ComponentCache,
    stats: ReconcileStats,
    /// True during a full pass; splice passes revisit paths legitimately.
    full_pass: bool,
}

impl Reconciler {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            cache: ComponentCache::new(policy),
            stats: ReconcileStats::default(),
            full_pass: false,
        }
    }

    pub fn cache(&self) -> &ComponentCache {
        &self.cache
    }

    /// Reconcile a whole frame. Starts a new cache frame and applies the
    /// eviction policy afterwards.
    pub fn reconcile(&mut self, tree: &mut Element) -> ReconcileStats {
        self.cache.frame += 1;
        self.stats = ReconcileStats::default();
        self.full_pass = true;
        self.visit(tree, "");
        self.full_pass = false;
        self.stats.evicted = self.cache.evict();

        tracing::trace!(
            frame = self.cache.frame,
            hits = self.stats.hits,
            misses = self.stats.misses,
            evicted = self.stats.evicted,
            "reconciled"
        );
        self.stats
    }

    /// Reconcile a subtree spliced into an already reconciled frame.
    pub fn reconcile_subtree(&mut self, node: &mut Element, path: &str) {
        self.visit(node, path);
    }

    fn visit(&mut self, node: &mut Element, path: &str) {
        if let Some(fresh) = node.component.clone() {
            let winner = self.resolve(fresh, path);
            let output = render_isolated(&winner);
            node.component = Some(winner);
            node.children = vec![output];
        }

        if node.children.is_empty() {
            return;
        }
        if self.full_pass {
            for key in duplicate_keys(&node.children) {
                tracing::warn!(%key, parent = %path, "duplicate sibling key, using index");
            }
        }

        let paths = node.child_paths_at(path);
        for (child, child_path) in node.children.iter_mut().zip(paths) {
            self.visit(child, &child_path);
        }
    }

    /// Pick the live instance for `fresh` at `path`.
    fn resolve(&mut self, fresh: ComponentRef, path: &str) -> ComponentRef {
        let key = CacheKey::new(type_id_of(&fresh), path);

        if self.full_pass && self.cache.seen_this_frame(&key) {
            tracing::warn!(%path, "structural path visited twice in one frame");
        }

        let Some(cached) = self.cache.touch(&key) else {
            tracing::debug!(
                component = short_type_name(type_name_of(&fresh)),
                %path,
                "new component identity"
            );
            self.cache.insert(key, fresh.clone());
            self.stats.misses += 1;
            return fresh;
        };

        self.stats.hits += 1;
        if !Rc::ptr_eq(&cached, &fresh) {
            refresh_props(&cached, &fresh);
        }
        cached
    }
}

/// Copy transient props from `fresh` into `cached` if it opts in.
fn refresh_props(cached: &ComponentRef, fresh: &ComponentRef) {
    let (Ok(mut live), Ok(new)) = (cached.try_borrow_mut(), fresh.try_borrow()) else {
        tracing::warn!("component busy, skipping props update");
        return;
    };
    if let Some(updater) = live.props_updater() {
        let new: &dyn Component = &*new;
        updater.update_props(new);
    }
}
