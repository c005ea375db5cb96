use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for search operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type returned by the upload/ingestion pipeline.
///
/// Variants other than [`IngestionError::Io`], [`IngestionError::Store`], I/O-backed
/// [`IngestionError::Csv`] errors and server-side [`IngestionError::Multipart`] errors are client
/// errors: the upload was rejected and the file slot was left untouched.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The multipart request carried no `file` field.
    #[error("No file uploaded")]
    MissingFile,

    /// The declared media type of the upload does not indicate CSV.
    #[error("File must be a CSV file")]
    NotCsv { media_type: Option<String> },

    /// The header row has zero columns.
    #[error("CSV file has no columns")]
    NoColumns,

    /// A data row has a different number of fields than the header row.
    #[error("Inconsistent number of columns at line {line}: expected {expected}, found {found}")]
    InconsistentColumns {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A cell is empty or whitespace-only.
    #[error("Empty value found in column {column} at line {line}")]
    EmptyValue { line: u64, column: String },

    /// The file had a header row but no data rows.
    #[error("CSV file is empty")]
    EmptyFile,

    /// The CSV reader failed (malformed UTF-8, or an I/O failure underneath it).
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The multipart body could not be read to the end (truncated, malformed, or over the size
    /// limit).
    #[error("{}", .0.body_text())]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// Underlying I/O error while spooling or reading the temporary upload.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The validated file could not be committed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl IngestionError {
    /// Returns `true` when the error was caused by the uploaded content rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Io(_) | Self::Store(_) => false,
            Self::Csv(err) => !err.is_io_error(),
            Self::Multipart(err) => !err.status().is_server_error(),
            _ => true,
        }
    }
}

/// Error type returned by the query engine.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The file slot is empty.
    #[error("No CSV file uploaded yet")]
    NotFound,

    /// A term was given without a column, or the column is not a header of the current file.
    #[error("Invalid column name")]
    InvalidColumn { column: Option<String> },

    /// `page` or `limit` is not a positive integer.
    #[error("Invalid page or limit")]
    InvalidPage,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Error type returned by [`crate::store::CsvStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored JSON (headers or row data) could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous holder of the store lock panicked.
    #[error("store lock poisoned")]
    Poisoned,

    /// Persisted state violates a store invariant.
    #[error("corrupt store: {message}")]
    Corrupt { message: String },
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}
