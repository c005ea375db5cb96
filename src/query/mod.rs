//! Search over the stored file.
//!
//! Raw [`SearchParams`] (as they arrive in a query string) are resolved against the current
//! [`FileDescriptor`] into a [`SearchRequest`], which the [`QueryEngine`] runs inside one
//! [`crate::store::Snapshot`]. Checks run in this order:
//!
//! 1. no file uploaded → [`QueryError::NotFound`]
//! 2. term without a column, or a column that is not a header → [`QueryError::InvalidColumn`]
//! 3. page/limit not positive integers → [`QueryError::InvalidPage`]

pub mod filter;
pub mod page;

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{QueryError, QueryResult};
use crate::store::CsvStore;
use crate::types::{FileDescriptor, SearchPage};

pub use filter::RowFilter;
pub use page::PageRequest;

/// Unvalidated search parameters, one field per query-string key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    pub term: Option<String>,
    pub column: Option<String>,
    pub exact: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SearchParams {
    /// Term to search for. An empty term counts as absent.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref().filter(|t| !t.is_empty())
    }

    /// `exact` defaults to `true`; any value other than `"true"` means substring matching.
    pub fn exact(&self) -> bool {
        self.exact.as_deref().is_none_or(|v| v == "true")
    }
}

/// A search resolved against a specific file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub filter: RowFilter,
    pub page: PageRequest,
}

impl SearchRequest {
    pub fn resolve(params: &SearchParams, file: &FileDescriptor) -> QueryResult<Self> {
        let filter = match params.term() {
            None => RowFilter::MatchAll,
            Some(term) => match params.column.as_deref() {
                Some(column) if file.has_column(column) => {
                    RowFilter::for_term(column, term, params.exact())
                }
                column => {
                    return Err(QueryError::InvalidColumn {
                        column: column.map(str::to_owned),
                    });
                }
            },
        };
        let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
        Ok(Self { filter, page })
    }
}

/// Runs searches against a [`CsvStore`].
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn CsvStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn CsvStore>) -> Self {
        Self { store }
    }

    /// Blocking; call from a blocking-capable thread when used inside an async runtime.
    pub fn search(&self, params: &SearchParams) -> QueryResult<SearchPage> {
        let snapshot = self.store.snapshot()?;
        let file = snapshot.file().ok_or(QueryError::NotFound)?;
        let request = SearchRequest::resolve(params, file)?;

        let total_count = snapshot.count(&request.filter)?;
        let data_entries = snapshot.rows(&request.filter, request.page.offset(), request.page.limit())?;

        Ok(SearchPage {
            headers: file.headers.clone(),
            total_count,
            data_entries,
            page: request.page.page(),
            limit: request.page.limit(),
        })
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine").finish_non_exhaustive()
    }
}
