//! Temporary upload artifacts.
//!
//! An upload body is spooled to a [`TempUpload`] before parsing. The file is removed when the
//! guard is dropped, which covers success, validation failure, internal error, and a cancelled
//! request alike.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Returns `true` if a declared media type indicates CSV (e.g. `text/csv`,
/// `application/csv`, `text/x-csv`).
pub fn is_csv_media_type(media_type: Option<&str>) -> bool {
    media_type.is_some_and(|m| m.to_ascii_lowercase().contains("csv"))
}

/// A spooled upload on disk, deleted on drop.
#[derive(Debug)]
pub struct TempUpload {
    path: Option<TempPath>,
    file: Option<File>,
    bytes_written: u64,
}

impl TempUpload {
    /// Create an empty temp file inside `dir`.
    pub fn new_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(dir)?;
        let (file, path) = named.into_parts();
        Ok(Self {
            path: Some(path),
            file: Some(File::from_std(file)),
            bytes_written: 0,
        })
    }

    /// Append a chunk of the request body.
    pub async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("temp upload already sealed"))?;
        file.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the write handle. Further [`TempUpload::append`] calls fail.
    pub async fn seal(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Location of the spooled file. Valid until the guard is dropped.
    pub fn path(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        // Close the handle first; some platforms refuse to unlink open files.
        drop(self.file.take());
        if let Some(path) = self.path.take() {
            let shown = path.to_path_buf();
            match path.close() {
                Ok(()) => tracing::debug!(path = %shown.display(), "removed temp upload"),
                Err(err) => {
                    tracing::warn!(path = %shown.display(), error = %err, "failed to remove temp upload")
                }
            }
        }
    }
}
