//! Session persistence for [`Stateful`](crate::component::Stateful) components.
//!
//! A snapshot is a flat map from component id to that component's saved
//! fields, written as JSON. Restoring is best effort: a component whose
//! `load_state` fails is logged and skipped, and [`StateMap`]'s typed getters
//! return `None` for missing or mistyped fields so implementors can keep
//! their defaults field by field.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::element::Element;
use crate::error::{Error, Result};

/// Current on-disk format version.
pub const SESSION_VERSION: u32 = 1;

// =============================================================================
// STATE MAP
// =============================================================================

/// Saved fields of one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMap {
    fields: BTreeMap<String, Value>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a serializable value. Values that fail to serialize are dropped.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.fields.insert(key.into(), v);
            }
            Err(err) => tracing::warn!(%err, "dropping unserializable state field"),
        }
        self
    }

    pub fn with<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Deserialize a field, `None` if missing or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.fields.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key)?.as_str()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key)?.as_bool()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key)?.as_i64()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key)?.as_u64()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key)?.as_f64()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Saved state of every stateful component in a mounted tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub components: BTreeMap<String, StateMap>,
}

impl SessionSnapshot {
    pub fn new() -> Self {
        Self {
            version: SESSION_VERSION,
            components: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&StateMap> {
        self.components.get(id)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| Error::Session {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), components = self.components.len(), "session saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Session {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Self = serde_json::from_str(&json)?;
        if snapshot.version != SESSION_VERSION {
            tracing::warn!(
                found = snapshot.version,
                expected = SESSION_VERSION,
                "session version mismatch, loading anyway"
            );
        }
        Ok(snapshot)
    }
}

/// Collect saved state from every stateful component in a reconciled tree.
///
/// Duplicate ids keep the first occurrence in pre-order.
pub fn snapshot(tree: &Element) -> SessionSnapshot {
    let mut snap = SessionSnapshot::new();
    tree.walk(&mut |node, _| {
        let Some(component) = &node.component else {
            return;
        };
        let Ok(mut guard) = component.try_borrow_mut() else {
            return;
        };
        if let Some(stateful) = guard.stateful() {
            let id = stateful.id();
            if id.is_empty() || snap.components.contains_key(&id) {
                return;
            }
            snap.components.insert(id, stateful.save_state());
        }
    });
    snap
}

/// Push saved state into matching components. Returns how many loaded.
pub fn restore(tree: &Element, snapshot: &SessionSnapshot) -> usize {
    let mut restored = 0;
    tree.walk(&mut |node, _| {
        let Some(component) = &node.component else {
            return;
        };
        let Ok(mut guard) = component.try_borrow_mut() else {
            return;
        };
        let Some(stateful) = guard.stateful() else {
            return;
        };
        let id = stateful.id();
        let Some(state) = snapshot.get(&id) else {
            return;
        };
        match stateful.load_state(state) {
            Ok(()) => restored += 1,
            Err(err) => tracing::warn!(%id, %err, "state restore failed, keeping defaults"),
        }
    });
    restored
}
