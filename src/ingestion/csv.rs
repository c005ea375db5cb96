//! CSV parsing and validation.
//!
//! Parsing stops at the first violation; the rest of the stream is never read.

use std::io::Read;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CsvUpload, RowData};

/// Reader settings used for uploads.
///
/// `flexible` is on so that ragged rows reach [`RowValidator`] and are reported as
/// [`IngestionError::InconsistentColumns`] rather than as an opaque reader error.
pub fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

/// Parse and validate a CSV file on disk.
///
/// `file_name` is the client-facing name recorded on the resulting upload; it need not match
/// `path` (uploads are spooled to anonymous temp files).
pub fn parse_csv_from_path(path: impl AsRef<Path>, file_name: &str) -> IngestionResult<CsvUpload> {
    let mut rdr = reader_builder().from_path(path)?;
    parse_csv_from_reader(&mut rdr, file_name)
}

/// Parse and validate CSV data from an existing reader.
///
/// Rules:
///
/// - The header row must have at least one column.
/// - Every data row must have exactly as many fields as the header row.
/// - No cell may be empty or whitespace-only.
/// - At least one data row must be present.
pub fn parse_csv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    file_name: &str,
) -> IngestionResult<CsvUpload> {
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let mut validator = RowValidator::new(headers)?;

    for (idx0, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1, so the first record is at least line 2.
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx0 as u64 + 2);
        validator.push(line, &record)?;
    }

    let (headers, rows) = validator.finish()?;
    Ok(CsvUpload {
        file_name: file_name.to_owned(),
        headers,
        rows,
    })
}

/// Incremental validator for data rows.
///
/// Created from the header row; each accepted row is converted into [`RowData`]. Any error
/// returned by [`RowValidator::push`] is terminal.
#[derive(Debug)]
pub struct RowValidator {
    headers: Vec<String>,
    rows: Vec<RowData>,
}

impl RowValidator {
    /// Start validating rows for the given header row.
    pub fn new(headers: Vec<String>) -> IngestionResult<Self> {
        if headers.is_empty() {
            return Err(IngestionError::NoColumns);
        }
        Ok(Self {
            headers,
            rows: Vec::new(),
        })
    }

    /// Validate one data row.
    pub fn push(&mut self, line: u64, record: &csv::StringRecord) -> IngestionResult<()> {
        if record.len() != self.headers.len() {
            return Err(IngestionError::InconsistentColumns {
                line,
                expected: self.headers.len(),
                found: record.len(),
            });
        }

        let mut row = RowData::new();
        for (header, raw) in self.headers.iter().zip(record.iter()) {
            if raw.trim().is_empty() {
                return Err(IngestionError::EmptyValue {
                    line,
                    column: header.clone(),
                });
            }
            row.insert(header.clone(), raw.to_owned());
        }
        self.rows.push(row);
        Ok(())
    }

    /// Finish validation, returning headers and rows.
    pub fn finish(self) -> IngestionResult<(Vec<String>, Vec<RowData>)> {
        if self.rows.is_empty() {
            return Err(IngestionError::EmptyFile);
        }
        Ok((self.headers, self.rows))
    }
}
