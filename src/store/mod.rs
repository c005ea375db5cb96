//! Storage for the single file slot.
//!
//! A [`CsvStore`] holds at most one [`FileDescriptor`] and its rows. Writers replace the whole
//! slot in one step ([`CsvStore::replace`]); readers go through a [`Snapshot`] so a search never
//! sees a mix of two files.
//!
//! - [`sqlite::SqliteStore`]: persistent, one transaction per replace.
//! - [`memory::MemoryStore`]: in-process, swaps an immutable generation behind an `Arc`.

pub mod memory;
pub mod sqlite;

use crate::error::StoreResult;
use crate::query::RowFilter;
use crate::types::{CsvUpload, FileDescriptor, Row};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Backing store for the file slot.
///
/// All methods block; async callers should run them on a blocking thread.
pub trait CsvStore: Send + Sync {
    /// Atomically replace the current file and all its rows with `upload`.
    ///
    /// On error the previous file and rows remain intact.
    fn replace(&self, upload: &CsvUpload) -> StoreResult<FileDescriptor>;

    /// Open a consistent read view of the slot.
    fn snapshot(&self) -> StoreResult<Box<dyn Snapshot + '_>>;

    /// Descriptor of the current file, if any.
    fn current_file(&self) -> StoreResult<Option<FileDescriptor>> {
        Ok(self.snapshot()?.file().cloned())
    }
}

/// A read view pinned to one generation of the file slot.
pub trait Snapshot {
    /// The file this view is pinned to. `None` if nothing has been uploaded.
    fn file(&self) -> Option<&FileDescriptor>;

    /// Number of rows matching `filter`.
    fn count(&self, filter: &RowFilter) -> StoreResult<u64>;

    /// Up to `limit` matching rows after skipping `offset`, in ascending id order.
    fn rows(&self, filter: &RowFilter, offset: u64, limit: u32) -> StoreResult<Vec<Row>>;
}
