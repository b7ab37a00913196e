//! Filter Module
//!
//! The Mongo-like predicate language. Pure functions, no I/O.
//!
//! ## Predicate Shape
//! ```text
//! { "$and": [ {..}, {..} ] }           all must match
//! { "$or":  [ {..}, {..} ] }           at least one must match
//! { "$not": {..} }                     must not match
//! { "field": literal }                 same as { "$eq": literal }
//! { "a.b":   { "$gte": 18, "$lt": 65 } }
//! ```
//!
//! Operators: `$eq` `$ne` `$gt` `$gte` `$lt` `$lte` `$in` `$nin` `$regex`.
//! Ordering operators only compare numbers.

mod options;
mod predicate;

pub use options::{FindOptions, SortOrder};
pub use predicate::{
    compare_numbers, is_operator_map, literal_operand, matches, resolve_field, Condition, Filter,
    AND, NOT, OR,
};
