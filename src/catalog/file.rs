//! File-backed catalog
//!
//! ## File Format
//! ```text
//! {
//!   "databases": {
//!     "<db>": {
//!       "db_name": "<db>",
//!       "created_at": "...", "updated_at": "...",
//!       "collections": {
//!         "<collection>": {
//!           "created_at": "...", "updated_at": "...",
//!           "settings": { "unique_fields": [..], "indexed_fields": [..] },
//!           "doc_count": 0
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{JsonDbError, Result};
use crate::storage::{read_json, write_json};

use super::{validate_name, Catalog, CollectionRecord, CollectionSettings, Namespace};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogData {
    #[serde(default)]
    databases: BTreeMap<String, DatabaseRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseRecord {
    db_name: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    collections: BTreeMap<String, CollectionRecord>,
}

/// Which declared field set an update targets
#[derive(Debug, Clone, Copy)]
enum FieldSet {
    Unique,
    Indexed,
}

/// [`Catalog`] persisted as one JSON file, cached in memory
///
/// ## Concurrency:
/// - `data`: Protected by its own RwLock, independent of the store guard
/// - Updates apply to a copy, persist it, then swap it in
pub struct FileCatalog {
    path: PathBuf,
    pretty: bool,
    data: RwLock<CatalogData>,
}

impl FileCatalog {
    /// Open the catalog file, starting empty when it does not exist
    pub fn open(path: &Path, pretty: bool) -> Result<Self> {
        let data: CatalogData = read_json(path)?.unwrap_or_default();
        let catalog = Self {
            path: path.to_path_buf(),
            pretty,
            data: RwLock::new(data),
        };
        if !path.exists() {
            write_json(path, &*catalog.data.read(), pretty)?;
        }
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Apply `f` to a copy, persist, then publish the copy
    fn update<T>(&self, f: impl FnOnce(&mut CatalogData) -> Result<T>) -> Result<T> {
        let mut data = self.data.write();
        let mut next = data.clone();
        let out = f(&mut next)?;
        write_json(&self.path, &next, self.pretty)?;
        *data = next;
        Ok(out)
    }

    fn read_collection<T>(
        &self,
        ns: &Namespace,
        f: impl FnOnce(&CollectionRecord) -> T,
    ) -> Result<T> {
        let data = self.data.read();
        let record = data
            .databases
            .get(&ns.database)
            .ok_or_else(|| database_not_found(&ns.database))?
            .collections
            .get(&ns.collection)
            .ok_or_else(|| collection_not_found(ns))?;
        Ok(f(record))
    }

    fn update_fields(&self, ns: &Namespace, fields: &[String], set: FieldSet, add: bool) -> Result<()> {
        self.update(|data| {
            let now = Self::now();
            let record = collection_mut(data, ns)?;
            let target: &mut BTreeSet<String> = match set {
                FieldSet::Unique => &mut record.settings.unique_fields,
                FieldSet::Indexed => &mut record.settings.indexed_fields,
            };
            for field in fields {
                let changed = if add {
                    target.insert(field.clone())
                } else {
                    target.remove(field)
                };
                if !changed {
                    debug!(namespace = %ns, field = %field, ?set, add, "field set unchanged");
                }
            }
            record.updated_at = now;
            Ok(())
        })
    }
}

impl Catalog for FileCatalog {
    fn unique_fields(&self, ns: &Namespace) -> Result<Vec<String>> {
        self.read_collection(ns, |r| r.settings.unique_fields.iter().cloned().collect())
    }

    fn indexed_fields(&self, ns: &Namespace) -> Result<Vec<String>> {
        self.read_collection(ns, |r| r.settings.indexed_fields.iter().cloned().collect())
    }

    fn refresh_stats(&self, ns: &Namespace, doc_count: usize) -> Result<()> {
        self.update(|data| {
            let now = Self::now();
            let db = data
                .databases
                .get_mut(&ns.database)
                .ok_or_else(|| database_not_found(&ns.database))?;
            let record = db
                .collections
                .get_mut(&ns.collection)
                .ok_or_else(|| collection_not_found(ns))?;
            record.doc_count = doc_count;
            record.updated_at = now.clone();
            db.updated_at = now;
            Ok(())
        })
    }

    fn set_unique_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()> {
        self.update_fields(ns, fields, FieldSet::Unique, true)
    }

    fn unset_unique_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()> {
        self.update_fields(ns, fields, FieldSet::Unique, false)
    }

    fn add_indexed_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()> {
        self.update_fields(ns, fields, FieldSet::Indexed, true)
    }

    fn remove_indexed_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()> {
        self.update_fields(ns, fields, FieldSet::Indexed, false)
    }

    fn record(&self, ns: &Namespace) -> Result<CollectionRecord> {
        self.read_collection(ns, CollectionRecord::clone)
    }

    fn has_database(&self, database: &str) -> Result<bool> {
        Ok(self.data.read().databases.contains_key(database))
    }

    fn has_collection(&self, ns: &Namespace) -> Result<bool> {
        Ok(self
            .data
            .read()
            .databases
            .get(&ns.database)
            .map(|db| db.collections.contains_key(&ns.collection))
            .unwrap_or(false))
    }

    fn create_database(&self, database: &str) -> Result<()> {
        validate_name("database", database)?;
        self.update(|data| {
            if data.databases.contains_key(database) {
                return Err(JsonDbError::AlreadyExists(format!("database '{}'", database)));
            }
            let now = Self::now();
            data.databases.insert(
                database.to_string(),
                DatabaseRecord {
                    db_name: database.to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                    collections: BTreeMap::new(),
                },
            );
            Ok(())
        })
    }

    fn drop_database(&self, database: &str) -> Result<()> {
        self.update(|data| {
            data.databases
                .remove(database)
                .map(|_| ())
                .ok_or_else(|| database_not_found(database))
        })
    }

    fn rename_database(&self, database: &str, new_name: &str) -> Result<()> {
        validate_name("database", new_name)?;
        self.update(|data| {
            if data.databases.contains_key(new_name) {
                return Err(JsonDbError::AlreadyExists(format!("database '{}'", new_name)));
            }
            let mut record = data
                .databases
                .remove(database)
                .ok_or_else(|| database_not_found(database))?;
            record.db_name = new_name.to_string();
            record.updated_at = Self::now();
            data.databases.insert(new_name.to_string(), record);
            Ok(())
        })
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.data.read().databases.keys().cloned().collect())
    }

    fn create_collection(&self, ns: &Namespace) -> Result<()> {
        validate_name("collection", &ns.collection)?;
        self.update(|data| {
            let now = Self::now();
            let db = data
                .databases
                .get_mut(&ns.database)
                .ok_or_else(|| database_not_found(&ns.database))?;
            if db.collections.contains_key(&ns.collection) {
                return Err(JsonDbError::AlreadyExists(format!("collection '{}'", ns)));
            }
            db.collections.insert(
                ns.collection.clone(),
                CollectionRecord {
                    created_at: now.clone(),
                    updated_at: now.clone(),
                    settings: CollectionSettings::default(),
                    doc_count: 0,
                },
            );
            db.updated_at = now;
            Ok(())
        })
    }

    fn drop_collection(&self, ns: &Namespace) -> Result<()> {
        self.update(|data| {
            let now = Self::now();
            let db = data
                .databases
                .get_mut(&ns.database)
                .ok_or_else(|| database_not_found(&ns.database))?;
            db.collections
                .remove(&ns.collection)
                .ok_or_else(|| collection_not_found(ns))?;
            db.updated_at = now;
            Ok(())
        })
    }

    fn rename_collection(&self, ns: &Namespace, new_name: &str) -> Result<()> {
        validate_name("collection", new_name)?;
        self.update(|data| {
            let now = Self::now();
            let db = data
                .databases
                .get_mut(&ns.database)
                .ok_or_else(|| database_not_found(&ns.database))?;
            if db.collections.contains_key(new_name) {
                return Err(JsonDbError::AlreadyExists(format!(
                    "collection '{}.{}'",
                    ns.database, new_name
                )));
            }
            let mut record = db
                .collections
                .remove(&ns.collection)
                .ok_or_else(|| collection_not_found(ns))?;
            record.updated_at = now.clone();
            db.collections.insert(new_name.to_string(), record);
            db.updated_at = now;
            Ok(())
        })
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        let db = data
            .databases
            .get(database)
            .ok_or_else(|| database_not_found(database))?;
        Ok(db.collections.keys().cloned().collect())
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn collection_mut<'a>(data: &'a mut CatalogData, ns: &Namespace) -> Result<&'a mut CollectionRecord> {
    data.databases
        .get_mut(&ns.database)
        .ok_or_else(|| database_not_found(&ns.database))?
        .collections
        .get_mut(&ns.collection)
        .ok_or_else(|| collection_not_found(ns))
}

fn database_not_found(database: &str) -> JsonDbError {
    JsonDbError::NotFound(format!("database '{}'", database))
}

fn collection_not_found(ns: &Namespace) -> JsonDbError {
    JsonDbError::NotFound(format!("collection '{}'", ns))
}
