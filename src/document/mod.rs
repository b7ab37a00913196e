//! Document Module
//!
//! The value model shared by every other component.
//!
//! ## Responsibilities
//! - Tagged values (null, bool, number, string, list, map)
//! - Documents with the reserved `_id` field
//! - Dot-path field resolution through nested maps
//! - Surrogate identifier generation

mod document;
mod id;
mod value;

pub use document::{Document, ID_FIELD};
pub use id::{next_id, IdGenerator};
pub use value::Value;
