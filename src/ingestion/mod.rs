//! Upload ingestion.
//!
//! Most callers should use [`IngestionPipeline`] (from [`pipeline`]), which:
//!
//! - validates a CSV upload ([`csv`])
//! - atomically replaces the stored file with it
//! - reports success/failure/alerts to an optional [`IngestionObserver`]
//!
//! [`upload::TempUpload`] owns the spooled request body and removes it on drop.

pub mod csv;
pub mod observability;
pub mod pipeline;
pub mod upload;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use pipeline::{IngestionOptions, IngestionPipeline};
pub use upload::{TempUpload, is_csv_media_type};
