//! Directory layout
//!
//! ```text
//! {root}/{db}/{collection}.json
//! {root}/{db}/{collection}.{field}.index
//! ```

use std::path::{Path, PathBuf};

use super::{Namespace, PathResolver};

/// Default [`PathResolver`] rooted at the data directory
#[derive(Debug, Clone)]
pub struct DirLayout {
    root: PathBuf,
}

impl DirLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Percent-encode anything outside `[A-Za-z0-9_.-]` so a field name can
    /// never escape the database directory
    fn encode_field(field: &str) -> String {
        let mut out = String::with_capacity(field.len());
        for byte in field.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'.' | b'-' => {
                    out.push(byte as char)
                }
                _ => out.push_str(&format!("%{:02X}", byte)),
            }
        }
        out
    }
}

impl PathResolver for DirLayout {
    fn database_location(&self, database: &str) -> PathBuf {
        self.root.join(database)
    }

    fn collection_location(&self, ns: &Namespace) -> PathBuf {
        self.database_location(&ns.database)
            .join(format!("{}.json", ns.collection))
    }

    fn index_location(&self, ns: &Namespace, field: &str) -> PathBuf {
        self.database_location(&ns.database).join(format!(
            "{}.{}.index",
            ns.collection,
            Self::encode_field(field)
        ))
    }
}
