//! Index Module
//!
//! Secondary indexes used to prune scans.
//!
//! ## Responsibilities
//! - One persisted value → id-set structure per declared field
//! - Keep entries in step with every insert/update/delete
//! - Narrow `find` candidates from top-level literal equalities
//!
//! ## File Format
//! ```text
//! {db}/{collection}.{field}.index
//! { "<canonical JSON of value>": ["<id>", ...], ... }
//! ```
//!
//! Indexes are derived data: deleting a file only costs a rebuild.

mod field_index;
mod manager;

pub use field_index::FieldIndex;
pub use manager::{Candidates, IndexManager};
