//! Pagination types for list endpoints.
//!
//! List endpoints use offset pagination (`skip`/`limit`) and return the
//! total number of matching rows next to the page.

use serde::{Deserialize, Serialize};

/// Hard cap on page size.
pub const MAX_LIMIT: u64 = 500;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of rows to skip.
    #[serde(default)]
    pub skip: u64,
    /// Number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.skip
    }

    /// Returns the limit for database queries, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Total number of matching items across all pages.
    pub count: u64,
}

impl<T> ListResponse<T> {
    /// Creates a new list response.
    #[must_use]
    pub const fn new(data: Vec<T>, count: u64) -> Self {
        Self { data, count }
    }
}

/// Response for count-only endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of matching items.
    pub count: u64,
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
