//! Upload-and-replace pipeline.
//!
//! [`IngestionPipeline::ingest_upload`] takes a spooled [`TempUpload`], validates it with
//! [`super::csv`], and commits it to the [`CsvStore`] in one replace. The temp file is removed
//! when the call returns, whatever the outcome.
//!
//! When an observer is configured, the pipeline reports:
//!
//! - `on_success` after a commit, with row/column stats
//! - `on_failure` on rejection or storage failure, with a computed severity
//! - `on_alert` when that severity is >= [`IngestionOptions::alert_at_or_above`]

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::store::CsvStore;
use crate::types::{CsvUpload, FileDescriptor};

use super::csv::{parse_csv_from_path, parse_csv_from_reader, reader_builder};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::upload::TempUpload;

/// Options controlling pipeline reporting.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Validates uploads and swaps them into the store.
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn CsvStore>,
    options: IngestionOptions,
}

impl fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn CsvStore>, options: IngestionOptions) -> Self {
        Self { store, options }
    }

    /// Validate and commit a spooled upload.
    ///
    /// Parsing and the store commit run on tokio's blocking pool. `upload` is dropped (and its
    /// file removed) before this returns.
    pub async fn ingest_upload(
        &self,
        upload: TempUpload,
        ctx: IngestionContext,
    ) -> IngestionResult<FileDescriptor> {
        let pipeline = self.clone();
        let path = upload.path();
        let panic_ctx = ctx.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let result = pipeline.ingest_path_unreported(&path, &ctx.file_name);
            pipeline.report(&ctx, &result);
            result
        })
        .await;
        drop(upload);

        joined.map_err(|err| self.reject(&panic_ctx, IngestionError::Io(std::io::Error::other(err))))?
    }

    /// Validate and commit a CSV file on disk. Blocking.
    pub fn ingest_path(&self, path: impl AsRef<Path>, ctx: &IngestionContext) -> IngestionResult<FileDescriptor> {
        let result = self.ingest_path_unreported(path.as_ref(), &ctx.file_name);
        self.report(ctx, &result);
        result
    }

    /// Validate and commit CSV read from `reader`. Blocking.
    pub fn ingest_reader<R: Read>(&self, reader: R, ctx: &IngestionContext) -> IngestionResult<FileDescriptor> {
        let mut rdr = reader_builder().from_reader(reader);
        let result = parse_csv_from_reader(&mut rdr, &ctx.file_name).and_then(|parsed| self.commit(&parsed));
        self.report(ctx, &result);
        result
    }

    /// Report an upload rejected outside the parse step (no file, wrong media type, broken
    /// transfer) and hand the error back.
    pub fn reject(&self, ctx: &IngestionContext, err: IngestionError) -> IngestionError {
        self.report_failure(ctx, &err);
        err
    }

    fn ingest_path_unreported(&self, path: &Path, file_name: &str) -> IngestionResult<FileDescriptor> {
        let parsed = parse_csv_from_path(path, file_name)?;
        self.commit(&parsed)
    }

    fn commit(&self, parsed: &CsvUpload) -> IngestionResult<FileDescriptor> {
        Ok(self.store.replace(parsed)?)
    }

    fn report(&self, ctx: &IngestionContext, result: &IngestionResult<FileDescriptor>) {
        match result {
            Ok(file) => {
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_success(
                        ctx,
                        IngestionStats {
                            file_id: file.id,
                            rows: file.row_count as usize,
                            columns: file.headers.len(),
                        },
                    );
                }
            }
            Err(err) => self.report_failure(ctx, err),
        }
    }

    fn report_failure(&self, ctx: &IngestionContext, err: &IngestionError) {
        let Some(obs) = self.options.observer.as_ref() else {
            return;
        };
        let sev = IngestionSeverity::for_error(err);
        obs.on_failure(ctx, sev, err);
        if sev >= self.options.alert_at_or_above {
            obs.on_alert(ctx, sev, err);
        }
    }
}
