//! Collection Store
//!
//! Find/insert/update/delete over one collection.
//!
//! Every call acquires the concurrency guard, loads the snapshot and the
//! declared index structures, works on them in memory and, for mutations,
//! persists snapshot → indexes → catalog stats before releasing the guard.
//! A mutation that fails validation persists nothing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{Catalog, CollectionRecord, Namespace, PathResolver};
use crate::constraint::{check_unique, first_violation};
use crate::document::{next_id, Document};
use crate::error::{JsonDbError, Result};
use crate::filter::{Filter, FindOptions};
use crate::index::{Candidates, FieldIndex, IndexManager};
use crate::storage::Snapshot;

use super::ConcurrencyGuard;

/// Handle on one collection
///
/// Cheap to clone; all clones (and all handles from the same engine) share
/// one [`ConcurrencyGuard`].
#[derive(Clone)]
pub struct CollectionStore {
    ns: Namespace,
    guard: Arc<ConcurrencyGuard>,
    catalog: Arc<dyn Catalog>,
    paths: Arc<dyn PathResolver>,
    pretty: bool,
}

impl CollectionStore {
    pub fn new(
        ns: Namespace,
        guard: Arc<ConcurrencyGuard>,
        catalog: Arc<dyn Catalog>,
        paths: Arc<dyn PathResolver>,
        pretty: bool,
    ) -> Self {
        Self {
            ns,
            guard,
            catalog,
            paths,
            pretty,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Documents matching `filter`, then sorted, skipped, limited, projected
    ///
    /// An empty result is not an error.
    pub fn find(&self, filter: &Document, options: &FindOptions) -> Result<Vec<Document>> {
        let _read_guard = self.guard.read();

        let snapshot = self.load_snapshot()?;
        let indexes = self.load_indexes(&snapshot)?;

        let docs: Vec<Document> = select(&snapshot, &indexes, filter)
            .into_iter()
            .filter_map(|id| snapshot.get(&id).cloned())
            .collect();

        debug!(namespace = %self.ns, matched = docs.len(), "find");
        Ok(options.apply(docs))
    }

    /// First match of `filter`; `NotFound` when nothing matches
    pub fn find_one(&self, filter: &Document) -> Result<Document> {
        self.find(filter, &FindOptions::new().limit(1))?
            .into_iter()
            .next()
            .ok_or_else(|| JsonDbError::NotFound(format!("no document in '{}' matches", self.ns)))
    }

    /// Number of documents matching `filter`
    pub fn count_documents(&self, filter: &Document) -> Result<usize> {
        let _read_guard = self.guard.read();

        let snapshot = self.load_snapshot()?;
        let indexes = self.load_indexes(&snapshot)?;
        Ok(select(&snapshot, &indexes, filter).len())
    }

    /// Current structure of an indexed field (rebuilt in memory if absent on
    /// disk); `None` when the field is not declared indexed
    pub fn index(&self, field: &str) -> Result<Option<FieldIndex>> {
        let _read_guard = self.guard.read();

        let snapshot = self.load_snapshot()?;
        let indexes = self.load_indexes(&snapshot)?;
        Ok(indexes.get(field).cloned())
    }

    /// Catalog entry of this collection
    pub fn record(&self) -> Result<CollectionRecord> {
        self.catalog.record(&self.ns)
    }

    /// Document count as last recorded in the catalog
    pub fn count(&self) -> Result<usize> {
        Ok(self.record()?.doc_count)
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Validate uniqueness, assign a fresh `_id` and store the document
    ///
    /// Any `_id` supplied by the caller is replaced.
    pub fn insert_one(&self, doc: Document) -> Result<Document> {
        let _write_guard = self.guard.write();

        let mut snapshot = self.load_snapshot()?;
        let unique = self.catalog.unique_fields(&self.ns)?;
        let mut indexes = self.load_indexes(&snapshot)?;

        let inserted = insert_into(&mut snapshot, &mut indexes, &unique, doc)?;
        self.commit(&snapshot, &indexes)?;

        debug!(namespace = %self.ns, id = ?inserted.id(), "insert_one");
        Ok(inserted)
    }

    /// Insert documents in order, stopping at the first failure
    ///
    /// Not atomic: documents inserted before the failing one stay committed
    /// and only the first error is reported.
    pub fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
        let _write_guard = self.guard.write();

        let mut snapshot = self.load_snapshot()?;
        let unique = self.catalog.unique_fields(&self.ns)?;
        let mut indexes = self.load_indexes(&snapshot)?;

        let mut inserted = Vec::with_capacity(docs.len());
        let mut failure = None;
        for doc in docs {
            match insert_into(&mut snapshot, &mut indexes, &unique, doc) {
                Ok(doc) => inserted.push(doc),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if !inserted.is_empty() {
            self.commit(&snapshot, &indexes)?;
        }
        debug!(namespace = %self.ns, inserted = inserted.len(), failed = failure.is_some(), "insert_many");

        match failure {
            Some(e) => Err(e),
            None => Ok(inserted),
        }
    }

    /// First result of [`update_many`](Self::update_many); `NotFound` if
    /// nothing matches
    ///
    /// Every match is patched, so a conflict on any of them fails the call.
    pub fn update_one(&self, filter: &Document, patch: &Document) -> Result<Document> {
        self.update_many(filter, patch)?
            .into_iter()
            .next()
            .ok_or_else(|| JsonDbError::NotFound(format!("no document in '{}' matches", self.ns)))
    }

    /// Patch every document matching `filter`
    ///
    /// All-or-nothing: a uniqueness conflict on any document aborts the call
    /// and leaves snapshot and indexes as they were.
    pub fn update_many(&self, filter: &Document, patch: &Document) -> Result<Vec<Document>> {
        let _write_guard = self.guard.write();

        let mut snapshot = self.load_snapshot()?;
        let unique = self.catalog.unique_fields(&self.ns)?;
        let mut indexes = self.load_indexes(&snapshot)?;

        let ids = select(&snapshot, &indexes, filter);
        let mut updated = Vec::with_capacity(ids.len());

        for id in &ids {
            let Some(current) = snapshot.get(id).cloned() else {
                continue;
            };
            indexes.remove_document(id, &current);

            let mut next = current;
            next.merge(patch);
            check_unique(&next, Some(id.as_str()), &unique, &snapshot)?;

            indexes.insert_document(id, &next);
            snapshot.insert(id.clone(), next.clone());
            updated.push(next);
        }

        if !updated.is_empty() {
            self.commit(&snapshot, &indexes)?;
        }
        debug!(namespace = %self.ns, updated = updated.len(), "update_many");
        Ok(updated)
    }

    /// Remove every document matching `filter`, returning how many went
    pub fn delete(&self, filter: &Document) -> Result<usize> {
        let _write_guard = self.guard.write();

        let mut snapshot = self.load_snapshot()?;
        let mut indexes = self.load_indexes(&snapshot)?;

        let ids = select(&snapshot, &indexes, filter);
        for id in &ids {
            if let Some(doc) = snapshot.remove(id) {
                indexes.remove_document(id, &doc);
            }
        }

        if !ids.is_empty() {
            self.commit(&snapshot, &indexes)?;
        }
        debug!(namespace = %self.ns, deleted = ids.len(), "delete");
        Ok(ids.len())
    }

    // =========================================================================
    // Constraint and Index Management
    // =========================================================================

    pub fn set_unique_field(&self, field: &str) -> Result<()> {
        self.set_unique_fields(&[field])
    }

    /// Declare fields unique; refused if current documents already clash
    pub fn set_unique_fields(&self, fields: &[&str]) -> Result<()> {
        let fields = owned(fields);
        let _write_guard = self.guard.write();

        let snapshot = self.load_snapshot()?;
        if let Some(field) = first_violation(&snapshot, &fields) {
            return Err(JsonDbError::ConstraintViolation {
                field: field.clone(),
            });
        }

        self.catalog.set_unique_fields(&self.ns, &fields)?;
        info!(namespace = %self.ns, ?fields, "unique fields set");
        Ok(())
    }

    pub fn unset_unique_field(&self, field: &str) -> Result<()> {
        self.unset_unique_fields(&[field])
    }

    pub fn unset_unique_fields(&self, fields: &[&str]) -> Result<()> {
        let fields = owned(fields);
        let _write_guard = self.guard.write();

        self.catalog.unset_unique_fields(&self.ns, &fields)?;
        info!(namespace = %self.ns, ?fields, "unique fields unset");
        Ok(())
    }

    pub fn create_index(&self, field: &str) -> Result<()> {
        self.create_indexes(&[field])
    }

    /// Declare indexed fields
    ///
    /// Any persisted structure for the fields is discarded; it is rebuilt from
    /// the snapshot on next use.
    pub fn create_indexes(&self, fields: &[&str]) -> Result<()> {
        let fields = owned(fields);
        let _write_guard = self.guard.write();

        for field in &fields {
            IndexManager::discard(&*self.paths, &self.ns, field)?;
        }
        self.catalog.add_indexed_fields(&self.ns, &fields)?;
        info!(namespace = %self.ns, ?fields, "indexes created");
        Ok(())
    }

    pub fn drop_index(&self, field: &str) -> Result<()> {
        self.drop_indexes(&[field])
    }

    /// Undeclare indexed fields and delete their persisted structures
    pub fn drop_indexes(&self, fields: &[&str]) -> Result<()> {
        let fields = owned(fields);
        let _write_guard = self.guard.write();

        self.catalog.remove_indexed_fields(&self.ns, &fields)?;
        for field in &fields {
            IndexManager::discard(&*self.paths, &self.ns, field)?;
        }
        info!(namespace = %self.ns, ?fields, "indexes dropped");
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn load_snapshot(&self) -> Result<Snapshot> {
        Snapshot::load(&self.paths.collection_location(&self.ns))
    }

    fn load_indexes(&self, snapshot: &Snapshot) -> Result<IndexManager> {
        let fields = self.catalog.indexed_fields(&self.ns)?;
        IndexManager::load(&*self.paths, &self.ns, &fields, snapshot)
    }

    /// Persist snapshot, then indexes, then refresh catalog stats
    fn commit(&self, snapshot: &Snapshot, indexes: &IndexManager) -> Result<()> {
        snapshot.save(&self.paths.collection_location(&self.ns), self.pretty)?;
        indexes.save(&*self.paths, &self.ns, self.pretty)?;
        self.catalog.refresh_stats(&self.ns, snapshot.len())
    }
}

/// Identifiers (in id order) of the documents matching `filter`
fn select(snapshot: &Snapshot, indexes: &IndexManager, filter: &Document) -> Vec<String> {
    let compiled = Filter::compile(filter);
    match indexes.candidate_ids(filter) {
        Candidates::Ids(ids) => ids
            .into_iter()
            .filter(|id| snapshot.get(id).is_some_and(|doc| compiled.matches(doc)))
            .collect(),
        Candidates::Unbounded => snapshot
            .iter()
            .filter(|(_, doc)| compiled.matches(doc))
            .map(|(id, _)| id.clone())
            .collect(),
    }
}

/// Validate and add one document to the working snapshot and indexes
fn insert_into(
    snapshot: &mut Snapshot,
    indexes: &mut IndexManager,
    unique: &[String],
    mut doc: Document,
) -> Result<Document> {
    check_unique(&doc, None, unique, snapshot)?;

    let id = next_id();
    doc.set_id(id.clone());
    snapshot.insert(id.clone(), doc.clone());
    indexes.insert_document(&id, &doc);
    Ok(doc)
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
