//! `csv-search` stores one uploaded CSV file and serves paginated, column-scoped searches over
//! its rows.
//!
//! The store has a single *file slot*. Every successful upload replaces the previous file and
//! all of its rows in one atomic step; a failed upload leaves the slot as it was.
//!
//! ## Upload rules
//!
//! An upload is rejected (HTTP 400) when:
//!
//! - no `file` field is present, or its media type does not mention `csv`
//! - the header row has no columns
//! - a data row has a different number of fields than the header row
//! - any cell is empty or whitespace-only
//! - there are no data rows
//!
//! ## Search
//!
//! `GET /data/search?term=&column=&exact=&page=&limit=` filters on one column, either by
//! case-sensitive equality (`exact=true`, the default) or case-sensitive substring, and returns
//! one page of rows in insertion order along with the total match count.
//!
//! ## Library use
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use csv_search::ingestion::{IngestionContext, IngestionOptions, IngestionPipeline};
//! use csv_search::query::{QueryEngine, SearchParams};
//! use csv_search::store::{CsvStore, MemoryStore};
//!
//! let store: Arc<dyn CsvStore> = Arc::new(MemoryStore::new());
//! let pipeline = IngestionPipeline::new(store.clone(), IngestionOptions::default());
//! let ctx = IngestionContext {
//!     file_name: "people.csv".to_string(),
//!     media_type: Some("text/csv".to_string()),
//!     bytes: 0,
//! };
//! pipeline
//!     .ingest_reader("name,age\nJohn,30\nJane,25\n".as_bytes(), &ctx)
//!     .unwrap();
//!
//! let params = SearchParams {
//!     term: Some("J".to_string()),
//!     column: Some("name".to_string()),
//!     exact: Some("false".to_string()),
//!     ..Default::default()
//! };
//! let page = QueryEngine::new(store).search(&params).unwrap();
//! assert_eq!(page.total_count, 2);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: CSV validation, temp-file handling, the upload pipeline and its observers
//! - [`query`]: search parameters, row filters, pagination, [`query::QueryEngine`]
//! - [`store`]: the [`store::CsvStore`] trait with SQLite and in-memory implementations
//! - [`server`]: axum router and handlers
//! - [`config`]: command-line/environment configuration
//! - [`types`], [`error`]: shared data model and error types

pub mod config;
pub mod error;
pub mod ingestion;
pub mod query;
pub mod server;
pub mod store;
pub mod types;

pub use error::{IngestionError, IngestionResult, QueryError, QueryResult, StoreError, StoreResult};
