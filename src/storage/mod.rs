//! Storage Module
//!
//! Persistent storage layer using human-readable JSON files.
//!
//! ## Responsibilities
//! - Load/save a collection's full document set as one unit
//! - Whole-file JSON read/write shared by indexes and the catalog
//!
//! ## File Format
//! ```text
//! {db}/{collection}.json
//! {
//!   "<id>": { "_id": "<id>", "field": <value>, ... },
//!   ...
//! }
//! ```
//!
//! Every mutation rewrites the file in place. There is no write-ahead log
//! and no atomic rename: a crash mid-write can leave a truncated file.

mod json_file;
mod snapshot;

pub use json_file::{read_json, remove_file, rename_file, write_json};
pub use snapshot::Snapshot;
