//! Page window parsing.

use crate::error::{QueryError, QueryResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// A validated, 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Both values must be positive.
    pub fn new(page: u32, limit: u32) -> QueryResult<Self> {
        if page == 0 || limit == 0 {
            return Err(QueryError::InvalidPage);
        }
        Ok(Self { page, limit })
    }

    /// Parse raw query-string values. Absent values fall back to page 1, limit 10.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> QueryResult<Self> {
        let page = parse_positive(page, DEFAULT_PAGE)?;
        let limit = parse_positive(limit, DEFAULT_LIMIT)?;
        Self::new(page, limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of matching rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> QueryResult<u32> {
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse::<u32>().map_err(|_| QueryError::InvalidPage),
    }
}
