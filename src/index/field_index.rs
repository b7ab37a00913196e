//! Field Index
//!
//! Bucket map for one indexed field: serialized value → set of ids.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::document::Value;

/// Value → identifier buckets for a single field
///
/// Persists as a JSON object mapping the canonical JSON text of each value
/// to the sorted list of identifiers holding it. Empty buckets are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldIndex {
    buckets: BTreeMap<String, BTreeSet<String>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to the bucket for `value`
    pub fn insert(&mut self, value: &Value, id: &str) {
        self.buckets
            .entry(value.to_key())
            .or_default()
            .insert(id.to_string());
    }

    /// Remove `id` from the bucket for `value`
    pub fn remove(&mut self, value: &Value, id: &str) {
        let key = value.to_key();
        if let Some(ids) = self.buckets.get_mut(&key) {
            ids.remove(id);
            if ids.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Identifiers currently holding `value`
    pub fn lookup(&self, value: &Value) -> Option<&BTreeSet<String>> {
        self.buckets.get(&value.to_key())
    }

    /// Iterate `(serialized value, ids)` pairs in key order
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.buckets.iter().map(|(k, ids)| (k.as_str(), ids))
    }

    /// Whether any bucket references `id`
    pub fn references(&self, id: &str) -> bool {
        self.buckets.values().any(|ids| ids.contains(id))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
