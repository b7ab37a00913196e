//! # JsonDB
//!
//! An embedded document store with:
//! - Schemaless JSON documents grouped into collections under databases
//! - A Mongo-like predicate language (`$and`, `$or`, `$not`, `$gt`, `$in`, `$regex`, ...)
//! - Persisted secondary indexes used to prune scans
//! - Unique-field constraints checked under the write lock
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │        (catalog, path layout, one concurrency guard)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Collection Store                          │
//! │          find / insert / update / delete (RwLock)           │
//! └──────┬──────────────┬──────────────────┬────────────────────┘
//!        │              │                  │
//!        ▼              ▼                  ▼
//!  ┌───────────┐  ┌─────────────┐   ┌─────────────┐
//!  │  Filter   │  │Index Manager│   │ Constraint  │
//!  │  Engine   │  │ (per field) │   │  Validator  │
//!  └───────────┘  └──────┬──────┘   └─────────────┘
//!                        │
//!                        ▼
//!                 ┌─────────────┐
//!                 │   Storage   │
//!                 │ (JSON files)│
//!                 └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use jsondb::{Document, Engine, FindOptions, SortOrder};
//! use serde_json::json;
//!
//! # fn main() -> jsondb::Result<()> {
//! let engine = Engine::open_path(std::path::Path::new("./data"))?;
//! engine.create_database("shop")?;
//! let users = engine.create_collection("shop", "users")?;
//! users.set_unique_field("email")?;
//!
//! users.insert_one(Document::from_json(json!({"email": "a@x", "age": 20}))?)?;
//!
//! let adults = users.find(
//!     &Document::from_json(json!({"age": {"$gte": 18}}))?,
//!     &FindOptions::new().sort_by("age", SortOrder::Ascending),
//! )?;
//! assert_eq!(adults.len(), 1);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod document;
pub mod filter;
pub mod index;
pub mod constraint;
pub mod storage;
pub mod catalog;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{JsonDbError, Result};
pub use config::Config;
pub use document::{Document, Value};
pub use filter::{FindOptions, SortOrder};
pub use store::CollectionStore;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of JsonDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
