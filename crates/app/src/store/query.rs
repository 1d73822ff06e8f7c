//! Filter, sort and cursor shapes shared by every store.

use std::{cmp::Ordering, collections::VecDeque};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::store::{StoreError, StoreResult};

/// A schemaless document. Field values the stores reason about are strings.
pub type Document = Map<String, Value>;

/// Name of the identity field every document carries.
pub const ID_FIELD: &str = "_id";

/// A single predicate over one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals the value exactly.
    Eq { field: &'static str, value: String },

    /// Field contains the needle, ignoring case.
    Contains { field: &'static str, needle: String },

    /// Field is a non-empty string (`true`) or not (`false`).
    Exists { field: &'static str, exists: bool },

    /// Field compares greater than or equal to the value, bytewise.
    Gte { field: &'static str, value: String },

    /// Field compares strictly less than the value, bytewise.
    Lt { field: &'static str, value: String },
}

impl Condition {
    /// Evaluate against an in-memory document.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq { field, value } => string_field(document, field) == Some(value.as_str()),
            Self::Contains { field, needle } => string_field(document, field)
                .is_some_and(|haystack| haystack.to_lowercase().contains(&needle.to_lowercase())),
            Self::Exists { field, exists } => {
                string_field(document, field).is_some_and(|value| !value.is_empty()) == *exists
            }
            Self::Gte { field, value } => {
                string_field(document, field).is_some_and(|current| current >= value.as_str())
            }
            Self::Lt { field, value } => {
                string_field(document, field).is_some_and(|current| current < value.as_str())
            }
        }
    }
}

/// A conjunction of conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: SmallVec<[Condition; 4]>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(self, field: &'static str, value: impl Into<String>) -> Self {
        self.and(Condition::Eq {
            field,
            value: value.into(),
        })
    }

    #[must_use]
    pub fn contains(self, field: &'static str, needle: impl Into<String>) -> Self {
        self.and(Condition::Contains {
            field,
            needle: needle.into(),
        })
    }

    #[must_use]
    pub fn exists(self, field: &'static str, exists: bool) -> Self {
        self.and(Condition::Exists { field, exists })
    }

    #[must_use]
    pub fn gte(self, field: &'static str, value: impl Into<String>) -> Self {
        self.and(Condition::Gte {
            field,
            value: value.into(),
        })
    }

    #[must_use]
    pub fn lt(self, field: &'static str, value: impl Into<String>) -> Self {
        self.and(Condition::Lt {
            field,
            value: value.into(),
        })
    }

    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(document))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field sort. Absent fields order before present ones when ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    #[must_use]
    pub const fn ascending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub const fn descending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two documents under this sort.
    #[must_use]
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        let ordering = string_field(left, self.field).cmp(&string_field(right, self.field));

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Options for `find`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub limit: Option<u64>,
    pub skip: u64,
}

/// Documents returned by `find`, drained into typed records by the caller.
#[derive(Debug, Default)]
pub struct Cursor {
    documents: VecDeque<Document>,
}

impl Cursor {
    #[must_use]
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: documents.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.documents.len()
    }

    /// Decode every remaining document into `into`, in cursor order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] on the first document that fails to decode.
    /// Documents before it have already been appended.
    pub fn drain_into<T: DeserializeOwned>(&mut self, into: &mut Vec<T>) -> StoreResult<()> {
        into.reserve(self.documents.len());

        while let Some(document) = self.documents.pop_front() {
            into.push(serde_json::from_value(Value::Object(document)).map_err(StoreError::from)?);
        }

        Ok(())
    }
}

/// Read a string field; non-string and null values count as absent.
#[must_use]
pub fn string_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}
