//! Name validation for databases and collections

use crate::error::{JsonDbError, Result};

/// Database name taken by the index metadata directory
const RESERVED_DATABASE: &str = "index";

/// Check a database or collection name
///
/// Names are ASCII letters, digits and underscores, not starting with a digit.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| JsonDbError::Config(format!("{} name must not be empty", kind)))?;

    if first.is_ascii_digit() {
        return Err(JsonDbError::Config(format!(
            "{} name '{}' must not start with a digit",
            kind, name
        )));
    }

    if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(JsonDbError::Config(format!(
            "{} name '{}' contains invalid character '{}'",
            kind, name, bad
        )));
    }

    if kind == "database" && name == RESERVED_DATABASE {
        return Err(JsonDbError::Config(format!(
            "database name '{}' is reserved",
            name
        )));
    }

    Ok(())
}
