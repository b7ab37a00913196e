//! Constraint Validator
//!
//! Collection-wide uniqueness of declared fields.
//!
//! Must run against the same snapshot, under the same guard acquisition, as
//! the write it protects.

use crate::document::Document;
use crate::error::{JsonDbError, Result};
use crate::storage::Snapshot;

/// Check `candidate` against every other document of `snapshot`
///
/// For each unique field the candidate's dot-path value is compared with the
/// same field of every document whose id differs from `excluding_id`. The
/// first equal pair fails with `ConstraintViolation` naming the field.
///
/// A candidate that lacks a unique field is not constrained by it.
pub fn check_unique(
    candidate: &Document,
    excluding_id: Option<&str>,
    unique_fields: &[String],
    snapshot: &Snapshot,
) -> Result<()> {
    for field in unique_fields {
        let Some(value) = candidate.get_path(field) else {
            continue;
        };

        let conflict = snapshot
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != excluding_id)
            .any(|(_, other)| other.get_path(field) == Some(value));

        if conflict {
            return Err(JsonDbError::ConstraintViolation {
                field: field.clone(),
            });
        }
    }
    Ok(())
}

/// Find a declared field the snapshot already violates
pub fn first_violation<'a>(snapshot: &Snapshot, fields: &'a [String]) -> Option<&'a String> {
    fields.iter().find(|field| {
        let field = std::slice::from_ref(*field);
        snapshot
            .iter()
            .any(|(id, doc)| check_unique(doc, Some(id.as_str()), field, snapshot).is_err())
    })
}
