//! Document
//!
//! A mapping from field name to value carrying the reserved `_id` field.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::error::{JsonDbError, Result};

use super::Value;

/// Reserved field holding the surrogate identifier
pub const ID_FIELD: &str = "_id";

/// A schemaless record
///
/// Serializes as a plain JSON object. Field iteration follows key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object
    ///
    /// Anything other than an object is `MalformedInput`.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(JsonDbError::malformed)
    }

    /// Convert a `serde_json::Value`, which must be an object
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match Value::from(value) {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(JsonDbError::MalformedInput(format!(
                "expected a JSON object, got {}",
                other.type_name()
            ))),
        }
    }

    /// The surrogate identifier, if one has been assigned
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.fields.insert(ID_FIELD.to_string(), Value::String(id));
    }

    /// Top-level field lookup
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Dot-path lookup (`a.b.c`) through nested maps
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.fields.get(head)?;
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shallow merge: every top-level key of `patch` replaces the existing
    /// one, except `_id` which never changes
    pub fn merge(&mut self, patch: &Document) {
        for (key, value) in patch.iter() {
            if key != ID_FIELD {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    /// Keep only the named top-level fields (and `_id`)
    pub fn project(&self, fields: &[String]) -> Document {
        let fields = self
            .fields
            .iter()
            .filter(|(key, _)| key.as_str() == ID_FIELD || fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Document { fields }
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Map(doc.fields)
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        serde_json::Value::from(Value::Map(doc.fields))
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = JsonDbError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Document::from_json(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
