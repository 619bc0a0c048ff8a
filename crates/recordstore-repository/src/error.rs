//! Error types for the record accessor.

use std::fmt;

use recordstore_core::{CoreError, Period};
use recordstore_storage::StorageError;

/// Which end of a time range failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Start,
    End,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Errors returned by [`Repository`](crate::Repository) operations.
///
/// Store failures are carried unchanged in [`RepositoryError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The store rejected or failed the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// `update` found no record with the given ID.
    #[error("Record not found: {collection}/{id}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The ID that matched nothing.
        id: String,
    },

    /// A time-range bound could not be parsed as a timestamp.
    #[error("Invalid range {bound} '{value}': {reason}")]
    InvalidRange {
        /// The offending bound.
        bound: RangeBound,
        /// The caller-supplied text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The current period's window could not be computed from the clock.
    #[error("Cannot compute {period} window: {source}")]
    Window {
        period: Period,
        #[source]
        source: CoreError,
    },
}

impl RepositoryError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidRange` error.
    #[must_use]
    pub fn invalid_range(
        bound: RangeBound,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRange {
            bound,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Window` error.
    #[must_use]
    pub fn window(period: Period, source: CoreError) -> Self {
        Self::Window { period, source }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an invalid range error.
    #[must_use]
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }

    /// Returns `true` if the store rejected the input against the schema.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_validation())
    }

    /// Returns the underlying store error, if any.
    #[must_use]
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage(err) if err.is_validation() => ErrorCategory::Validation,
            Self::Storage(_) => ErrorCategory::Store,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidRange { .. } => ErrorCategory::InvalidRange,
            Self::Window { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of accessor errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input failed the record schema.
    Validation,
    /// No record with the given ID.
    NotFound,
    /// Malformed time-range bound.
    InvalidRange,
    /// Any other store failure.
    Store,
    /// A failure inside the accessor itself.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::InvalidRange => write!(f, "invalid_range"),
            Self::Store => write!(f, "store"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Type alias for an accessor result.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
