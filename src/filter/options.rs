//! Find options
//!
//! Sorting, pagination and projection applied after filtering.

use std::cmp::Ordering;

use crate::document::Document;

use super::compare_numbers;

/// Direction of one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Mongo-style direction: a negative number is descending
    pub fn from_direction(direction: i64) -> Self {
        if direction < 0 {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

/// Options for `find`
///
/// Order of application: sort, skip, limit, projection.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort keys, evaluated left to right
    pub sort: Vec<(String, SortOrder)>,
    /// Leading matches to drop
    pub skip: usize,
    /// Cap on the number of results; `None` is unbounded
    pub limit: Option<usize>,
    /// Top-level fields to keep (`_id` is always kept)
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort key
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sort, paginate and project a list of matches
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if !self.sort.is_empty() {
            docs.sort_by(|a, b| self.compare(a, b));
        }

        let docs = docs
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX));

        match &self.projection {
            Some(fields) => docs.map(|doc| doc.project(fields)).collect(),
            None => docs.collect(),
        }
    }

    /// Compare by each sort key in turn; incomparable values fall through
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.sort {
            let ordering = match (a.get_path(field), b.get_path(field)) {
                (Some(x), Some(y)) => compare_numbers(x, y),
                _ => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                };
            }
        }
        Ordering::Equal
    }
}
