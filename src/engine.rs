//! Engine Module
//!
//! Entry point that wires the collaborators together.
//!
//! ## Responsibilities
//! - Create the data root and open the catalog
//! - Own the single concurrency guard shared by every collection handle,
//!   and by every engine opened on the same data root in this process
//! - Hand out [`CollectionStore`] handles for existing collections
//! - Database and collection lifecycle (create, drop, rename, list)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::catalog::{validate_name, Catalog, DirLayout, FileCatalog, Namespace, PathResolver};
use crate::config::Config;
use crate::error::{JsonDbError, Result};
use crate::index::IndexManager;
use crate::storage::{remove_file, rename_file, Snapshot};
use crate::store::{CollectionStore, ConcurrencyGuard};

/// The embedded document store
///
/// ## Concurrency Model
///
/// - One [`ConcurrencyGuard`] for the whole engine, across all databases
/// - Engines opened with [`Engine::open`] on the same data root (and catalog
///   file) share that guard and one [`FileCatalog`]; the first opener's
///   `pretty_json` decides the catalog's format
/// - [`Engine::with_collaborators`] always starts a fresh guard, so at most
///   one such engine may run per data root
/// - Collection reads take it shared, every mutation takes it exclusive
/// - Lifecycle operations here take it exclusive too, so a collection is
///   never dropped or renamed under a running operation
/// - There is one lock and no nested acquisition, so no deadlock is possible
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Shared by every `CollectionStore` this engine hands out
    guard: Arc<ConcurrencyGuard>,

    /// Per-collection metadata
    catalog: Arc<dyn Catalog>,

    /// On-disk locations
    paths: Arc<dyn PathResolver>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open (or initialize) the catalog file
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| JsonDbError::storage(&config.data_dir, e))?;

        // Step 2: Join (or start) the shared state of this data root
        let (guard, catalog) = shared_root(&config)?;
        let paths = DirLayout::new(&config.data_dir);

        info!(data_dir = %config.data_dir.display(), "engine opened");
        Ok(Self {
            config,
            guard,
            catalog,
            paths: Arc::new(paths),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Build an engine over caller-provided collaborators
    pub fn with_collaborators(
        config: Config,
        catalog: Arc<dyn Catalog>,
        paths: Arc<dyn PathResolver>,
    ) -> Self {
        Self {
            config,
            guard: Arc::new(ConcurrencyGuard::new()),
            catalog,
            paths,
        }
    }

    /// Handle on an existing collection
    ///
    /// Empty names are `NotSelected`; unknown ones are `NotFound`.
    pub fn collection(&self, database: &str, collection: &str) -> Result<CollectionStore> {
        let ns = Namespace::new(database, collection)?;
        if !self.catalog.has_database(&ns.database)? {
            return Err(JsonDbError::NotFound(format!("database '{}'", ns.database)));
        }
        if !self.catalog.has_collection(&ns)? {
            return Err(JsonDbError::NotFound(format!("collection '{}'", ns)));
        }
        Ok(self.store(ns))
    }

    // =========================================================================
    // Database Lifecycle
    // =========================================================================

    pub fn create_database(&self, database: &str) -> Result<()> {
        let _write_guard = self.guard.write();

        validate_name("database", database)?;
        if self.catalog.has_database(database)? {
            return Err(JsonDbError::AlreadyExists(format!("database '{}'", database)));
        }

        let dir = self.paths.database_location(database);
        fs::create_dir_all(&dir).map_err(|e| JsonDbError::storage(&dir, e))?;
        self.catalog.create_database(database)?;

        info!(database, "database created");
        Ok(())
    }

    /// Remove a database with every collection and index in it
    pub fn drop_database(&self, database: &str) -> Result<()> {
        if database.is_empty() {
            return Err(JsonDbError::NotSelected);
        }
        let _write_guard = self.guard.write();

        if !self.catalog.has_database(database)? {
            return Err(JsonDbError::NotFound(format!("database '{}'", database)));
        }

        let dir = self.paths.database_location(database);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| JsonDbError::storage(&dir, e))?;
        }
        self.catalog.drop_database(database)?;

        info!(database, "database dropped");
        Ok(())
    }

    /// Rename a database, moving its directory with every collection in it
    pub fn rename_database(&self, database: &str, new_name: &str) -> Result<()> {
        if database.is_empty() {
            return Err(JsonDbError::NotSelected);
        }
        let _write_guard = self.guard.write();

        validate_name("database", new_name)?;
        if !self.catalog.has_database(database)? {
            return Err(JsonDbError::NotFound(format!("database '{}'", database)));
        }
        if self.catalog.has_database(new_name)? {
            return Err(JsonDbError::AlreadyExists(format!("database '{}'", new_name)));
        }

        let from = self.paths.database_location(database);
        let to = self.paths.database_location(new_name);
        if from.exists() {
            fs::rename(&from, &to).map_err(|e| JsonDbError::storage(&from, e))?;
        } else {
            fs::create_dir_all(&to).map_err(|e| JsonDbError::storage(&to, e))?;
        }
        self.catalog.rename_database(database, new_name)?;

        info!(from = database, to = new_name, "database renamed");
        Ok(())
    }

    pub fn list_databases(&self) -> Result<Vec<String>> {
        let _read_guard = self.guard.read();
        self.catalog.list_databases()
    }

    // =========================================================================
    // Collection Lifecycle
    // =========================================================================

    /// Create an empty collection and return a handle on it
    pub fn create_collection(&self, database: &str, collection: &str) -> Result<CollectionStore> {
        let ns = Namespace::new(database, collection)?;
        let _write_guard = self.guard.write();

        if !self.catalog.has_database(&ns.database)? {
            return Err(JsonDbError::NotFound(format!("database '{}'", ns.database)));
        }
        self.catalog.create_collection(&ns)?;
        Snapshot::new().save(&self.paths.collection_location(&ns), self.config.pretty_json)?;

        info!(namespace = %ns, "collection created");
        Ok(self.store(ns))
    }

    /// Remove a collection's snapshot, its index structures and its record
    pub fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        let ns = Namespace::new(database, collection)?;
        let _write_guard = self.guard.write();

        let indexed = self.catalog.indexed_fields(&ns)?;
        for field in &indexed {
            IndexManager::discard(&*self.paths, &ns, field)?;
        }
        remove_file(&self.paths.collection_location(&ns))?;
        self.catalog.drop_collection(&ns)?;

        info!(namespace = %ns, "collection dropped");
        Ok(())
    }

    /// Rename a collection, moving its snapshot and index structures
    pub fn rename_collection(&self, database: &str, collection: &str, new_name: &str) -> Result<()> {
        let ns = Namespace::new(database, collection)?;
        let target = Namespace::new(database, new_name)?;
        let _write_guard = self.guard.write();

        validate_name("collection", new_name)?;
        if !self.catalog.has_collection(&ns)? {
            return Err(JsonDbError::NotFound(format!("collection '{}'", ns)));
        }
        if self.catalog.has_collection(&target)? {
            return Err(JsonDbError::AlreadyExists(format!("collection '{}'", target)));
        }

        rename_file(
            &self.paths.collection_location(&ns),
            &self.paths.collection_location(&target),
        )?;
        for field in self.catalog.indexed_fields(&ns)? {
            rename_file(
                &self.paths.index_location(&ns, &field),
                &self.paths.index_location(&target, &field),
            )?;
        }
        self.catalog.rename_collection(&ns, new_name)?;

        info!(from = %ns, to = %target, "collection renamed");
        Ok(())
    }

    pub fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        if database.is_empty() {
            return Err(JsonDbError::NotSelected);
        }
        let _read_guard = self.guard.read();
        self.catalog.list_collections(database)
    }

    /// Document count recorded in the catalog
    pub fn count(&self, database: &str, collection: &str) -> Result<usize> {
        let ns = Namespace::new(database, collection)?;
        Ok(self.catalog.record(&ns)?.doc_count)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the path resolver
    pub fn paths(&self) -> &dyn PathResolver {
        &*self.paths
    }

    fn store(&self, ns: Namespace) -> CollectionStore {
        CollectionStore::new(
            ns,
            Arc::clone(&self.guard),
            Arc::clone(&self.catalog),
            Arc::clone(&self.paths),
            self.config.pretty_json,
        )
    }
}

// =============================================================================
// Shared Root Registry
// =============================================================================

/// Live guard and catalog of one data root, held weakly so the entry dies
/// with the last engine or store handle using it
struct SharedRoot {
    guard: Weak<ConcurrencyGuard>,
    catalog: Weak<FileCatalog>,
}

static SHARED_ROOTS: LazyLock<Mutex<HashMap<PathBuf, SharedRoot>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Guard and catalog for `config`'s data root, keyed by the canonical
/// catalog path
fn shared_root(config: &Config) -> Result<(Arc<ConcurrencyGuard>, Arc<dyn Catalog>)> {
    let root = fs::canonicalize(&config.data_dir)
        .map_err(|e| JsonDbError::storage(&config.data_dir, e))?;
    let key = root.join(&config.catalog_file);

    let mut registry = SHARED_ROOTS.lock();
    registry.retain(|_, entry| entry.guard.strong_count() > 0);

    if let Some(entry) = registry.get(&key) {
        if let (Some(guard), Some(catalog)) = (entry.guard.upgrade(), entry.catalog.upgrade()) {
            debug!(root = %root.display(), "joining open data root");
            let catalog: Arc<dyn Catalog> = catalog;
            return Ok((guard, catalog));
        }
    }

    let guard = Arc::new(ConcurrencyGuard::new());
    let catalog = Arc::new(FileCatalog::open(&key, config.pretty_json)?);
    registry.insert(
        key,
        SharedRoot {
            guard: Arc::downgrade(&guard),
            catalog: Arc::downgrade(&catalog),
        },
    );
    let catalog: Arc<dyn Catalog> = catalog;
    Ok((guard, catalog))
}
