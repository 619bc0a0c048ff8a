//! Query types for the document store abstraction layer.

use recordstore_core::TimeWindow;
use serde::{Deserialize, Serialize};

use crate::document::CREATED_AT_FIELD;

/// Selects documents. All present conditions must hold; an empty filter
/// matches every document in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Exact identifier match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `createdAt` must fall in this half-open window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<TimeWindow>,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching the document with the given ID.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::default().with_id(id)
    }

    /// A filter matching documents created within `window`.
    #[must_use]
    pub fn created_within(window: TimeWindow) -> Self {
        Self::default().with_created_within(window)
    }

    /// Adds an identifier condition.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a creation-time condition.
    #[must_use]
    pub fn with_created_within(mut self, window: TimeWindow) -> Self {
        self.created_at = Some(window);
        self
    }

    /// Returns true if this filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.created_at.is_none()
    }
}

/// Options for `find_many`: sort, then skip, then limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Number of documents to skip.
    #[serde(default)]
    pub skip: u64,
    /// Maximum number of documents to return. `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Sort keys, most significant first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortParam>,
}

impl FindOptions {
    /// Creates new empty `FindOptions`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the skip parameter.
    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the limit parameter.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort parameter.
    #[must_use]
    pub fn with_sort(mut self, sort: SortParam) -> Self {
        self.sort.push(sort);
        self
    }

    /// Adds sort keys from a spec such as `"-createdAt title"`.
    #[must_use]
    pub fn with_sort_spec(mut self, spec: &str) -> Self {
        self.sort.extend(SortParam::parse_spec(spec));
        self
    }
}

/// A sort parameter for find results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParam {
    /// The field to sort by.
    pub field: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl SortParam {
    /// Creates a new `SortParam`.
    #[must_use]
    pub fn new(field: impl Into<String>, descending: bool) -> Self {
        Self {
            field: field.into(),
            descending,
        }
    }

    /// Creates an ascending sort parameter.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, false)
    }

    /// Creates a descending sort parameter.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, true)
    }

    /// Newest documents first.
    #[must_use]
    pub fn newest_first() -> Self {
        Self::desc(CREATED_AT_FIELD)
    }

    /// Parses one key; a leading `-` means descending.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(key.strip_prefix('+').unwrap_or(key)),
        }
    }

    /// Parses a whitespace or comma separated list of keys.
    #[must_use]
    pub fn parse_spec(spec: &str) -> Vec<Self> {
        spec.split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != "-" && *key != "+")
            .map(Self::parse)
            .collect()
    }
}

/// Options for `find_one_and_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Return the document as it is after the update instead of before.
    pub return_new: bool,
    /// Validate the merged document against the collection schema.
    pub run_validators: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_new: true,
            run_validators: true,
        }
    }
}
