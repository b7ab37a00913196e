//! Collection Snapshot
//!
//! The full document set of one collection, persisted as a single JSON
//! object keyed by identifier.

use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;

use super::json_file::{read_json, write_json};

/// Identifier → document, ordered by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    documents: BTreeMap<String, Document>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from disk; a missing or empty file is an empty collection
    ///
    /// Documents whose stored `_id` is absent are given their key back.
    pub fn load(path: &Path) -> Result<Self> {
        let mut snapshot: Snapshot = read_json(path)?.unwrap_or_default();
        for (id, doc) in snapshot.documents.iter_mut() {
            if doc.id() != Some(id.as_str()) {
                doc.set_id(id.clone());
            }
        }
        Ok(snapshot)
    }

    /// Rewrite the whole snapshot
    pub fn save(&self, path: &Path, pretty: bool) -> Result<()> {
        write_json(path, self, pretty)
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.get_mut(id)
    }

    /// Store a document under `id`, returning any previous version
    pub fn insert(&mut self, id: String, doc: Document) -> Option<Document> {
        self.documents.insert(id, doc)
    }

    pub fn remove(&mut self, id: &str) -> Option<Document> {
        self.documents.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a Document);
    type IntoIter = btree_map::Iter<'a, String, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
