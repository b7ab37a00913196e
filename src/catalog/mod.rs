//! Catalog Module
//!
//! Collaborators the collection store consults but does not own.
//!
//! ## Responsibilities
//! - [`Catalog`]: per-collection metadata (timestamps, document count,
//!   declared unique and indexed fields) plus database/collection lifecycle
//! - [`PathResolver`]: maps a namespace to on-disk locations
//!
//! [`FileCatalog`] and [`DirLayout`] are the default implementations used by
//! [`Engine::open`](crate::Engine::open).

mod file;
mod layout;
mod names;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{JsonDbError, Result};

pub use file::FileCatalog;
pub use layout::DirLayout;
pub use names::validate_name;

// =============================================================================
// Namespace
// =============================================================================

/// A (database, collection) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    /// Build a namespace; either name being empty is `NotSelected`
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let collection = collection.into();
        if database.is_empty() || collection.is_empty() {
            return Err(JsonDbError::NotSelected);
        }
        Ok(Self {
            database,
            collection,
        })
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

// =============================================================================
// Records
// =============================================================================

/// Declared constraints of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSettings {
    #[serde(default)]
    pub unique_fields: BTreeSet<String>,
    #[serde(default)]
    pub indexed_fields: BTreeSet<String>,
}

/// Catalog entry of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub settings: CollectionSettings,
    #[serde(default)]
    pub doc_count: usize,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Authoritative per-collection configuration and statistics
pub trait Catalog: Send + Sync {
    /// Fields that must hold collection-wide unique values
    fn unique_fields(&self, ns: &Namespace) -> Result<Vec<String>>;

    /// Fields with a persisted value → id index
    fn indexed_fields(&self, ns: &Namespace) -> Result<Vec<String>>;

    /// Record the current document count and bump `updated_at`
    fn refresh_stats(&self, ns: &Namespace, doc_count: usize) -> Result<()>;

    fn set_unique_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()>;
    fn unset_unique_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()>;
    fn add_indexed_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()>;
    fn remove_indexed_fields(&self, ns: &Namespace, fields: &[String]) -> Result<()>;

    /// Full catalog entry of a collection
    fn record(&self, ns: &Namespace) -> Result<CollectionRecord>;

    fn has_database(&self, database: &str) -> Result<bool>;
    fn has_collection(&self, ns: &Namespace) -> Result<bool>;

    fn create_database(&self, database: &str) -> Result<()>;
    fn drop_database(&self, database: &str) -> Result<()>;
    fn rename_database(&self, database: &str, new_name: &str) -> Result<()>;
    fn list_databases(&self) -> Result<Vec<String>>;

    fn create_collection(&self, ns: &Namespace) -> Result<()>;
    fn drop_collection(&self, ns: &Namespace) -> Result<()>;
    fn rename_collection(&self, ns: &Namespace, new_name: &str) -> Result<()>;
    fn list_collections(&self, database: &str) -> Result<Vec<String>>;
}

/// Maps namespaces to on-disk locations
pub trait PathResolver: Send + Sync {
    /// Directory holding every collection of a database
    fn database_location(&self, database: &str) -> PathBuf;

    /// Snapshot file of a collection
    fn collection_location(&self, ns: &Namespace) -> PathBuf;

    /// Index file of one field of a collection
    fn index_location(&self, ns: &Namespace, field: &str) -> PathBuf;
}
