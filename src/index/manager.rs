//! Index Manager
//!
//! Holds the bucket maps of every declared indexed field of one collection
//! for the duration of a single store operation.
//!
//! ## Lifecycle per operation
//! 1. `load` reads each declared field's persisted structure; a missing one
//!    is rebuilt from the snapshot and marked dirty
//! 2. Mutations bracket each document change with `remove_document` (before)
//!    and `insert_document` (after)
//! 3. `save` persists the dirty structures once the snapshot is saved

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::{Namespace, PathResolver};
use crate::document::Document;
use crate::error::Result;
use crate::filter::{literal_operand, resolve_field};
use crate::storage::{read_json, remove_file, write_json, Snapshot};

use super::FieldIndex;

/// Outcome of index pruning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// No declared index participates; scan everything
    Unbounded,
    /// Only these identifiers can match
    Ids(BTreeSet<String>),
}

impl Candidates {
    /// Whether `id` survives pruning
    pub fn admits(&self, id: &str) -> bool {
        match self {
            Candidates::Unbounded => true,
            Candidates::Ids(ids) => ids.contains(id),
        }
    }
}

/// Bucket maps of one collection, keyed by field
pub struct IndexManager {
    indexes: BTreeMap<String, FieldIndex>,
    dirty: BTreeSet<String>,
}

impl IndexManager {
    /// Load the structures of `fields`, rebuilding any that are not on disk
    pub fn load(
        paths: &dyn PathResolver,
        ns: &Namespace,
        fields: &[String],
        snapshot: &Snapshot,
    ) -> Result<Self> {
        let mut indexes = BTreeMap::new();
        let mut dirty = BTreeSet::new();

        for field in fields {
            let path = paths.index_location(ns, field);
            let index = match read_json::<FieldIndex>(&path)? {
                Some(index) => index,
                None => {
                    debug!(namespace = %ns, field = %field, "index not on disk, building from snapshot");
                    dirty.insert(field.clone());
                    Self::build(field, snapshot)
                }
            };
            indexes.insert(field.clone(), index);
        }

        Ok(Self { indexes, dirty })
    }

    /// Build one field's buckets from a snapshot
    pub fn build(field: &str, snapshot: &Snapshot) -> FieldIndex {
        let mut index = FieldIndex::new();
        for (id, doc) in snapshot {
            if let Some(value) = resolve_field(doc, field) {
                index.insert(value, id);
            }
        }
        index
    }

    /// Add or remove `id` in the bucket of `doc`'s current value for `field`
    ///
    /// Values are resolved the same way the filter engine resolves keys, so a
    /// literal-equality lookup finds exactly the documents the filter would.
    pub fn rebuild_entry(&mut self, field: &str, id: &str, doc: &Document, removing: bool) {
        let Some(index) = self.indexes.get_mut(field) else {
            return;
        };
        if let Some(value) = resolve_field(doc, field) {
            if removing {
                index.remove(value, id);
            } else {
                index.insert(value, id);
            }
            self.dirty.insert(field.to_string());
        }
    }

    /// Drop every entry of a document (call before it changes or goes away)
    pub fn remove_document(&mut self, id: &str, doc: &Document) {
        for field in self.fields() {
            self.rebuild_entry(&field, id, doc, true);
        }
    }

    /// Add entries for a document (call after it is in its final shape)
    pub fn insert_document(&mut self, id: &str, doc: &Document) {
        for field in self.fields() {
            self.rebuild_entry(&field, id, doc, false);
        }
    }

    /// Prune by the top-level literal equalities of `filter`
    ///
    /// Top-level keys are ANDed, so the buckets of all participating fields
    /// are intersected. The result never drops a document the filter would
    /// match; every candidate is still re-checked by the filter engine.
    pub fn candidate_ids(&self, filter: &Document) -> Candidates {
        let mut result: Option<BTreeSet<String>> = None;

        for (field, index) in &self.indexes {
            let Some(literal) = filter.get(field).and_then(literal_operand) else {
                continue;
            };
            let bucket = index.lookup(literal).cloned().unwrap_or_default();
            result = Some(match result {
                Some(acc) => acc.intersection(&bucket).cloned().collect(),
                None => bucket,
            });
        }

        match result {
            Some(ids) => {
                debug!(candidates = ids.len(), "index pruning applied");
                Candidates::Ids(ids)
            }
            None => Candidates::Unbounded,
        }
    }

    /// Persist every structure changed or rebuilt since `load`
    pub fn save(&self, paths: &dyn PathResolver, ns: &Namespace, pretty: bool) -> Result<()> {
        for field in &self.dirty {
            if let Some(index) = self.indexes.get(field) {
                write_json(&paths.index_location(ns, field), index, pretty)?;
            }
        }
        Ok(())
    }

    /// Delete the persisted structure of `field`
    pub fn discard(paths: &dyn PathResolver, ns: &Namespace, field: &str) -> Result<()> {
        remove_file(&paths.index_location(ns, field))
    }

    pub fn get(&self, field: &str) -> Option<&FieldIndex> {
        self.indexes.get(field)
    }

    pub fn fields(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }
}
