use recordstore_core::PaginationConfig;
use serde::{Deserialize, Serialize};

/// Zero-based page request.
///
/// A limit of `0` means "use the configured default". Limits above the
/// configured maximum are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// The first page of `limit` records.
    pub fn first(limit: u64) -> Self {
        Self::new(0, limit)
    }

    /// Number of records to skip before this page.
    pub fn skip(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// Applies the configured default and maximum to the requested limit.
    pub(crate) fn resolve(self, config: &PaginationConfig) -> Self {
        let limit = match self.limit {
            0 => config.default_limit,
            n if n > config.max_limit => {
                tracing::warn!(
                    requested = n,
                    max_limit = config.max_limit,
                    "Page limit clamped to maximum"
                );
                config.max_limit
            }
            n => n,
        };
        Self::new(self.page, limit)
    }
}
