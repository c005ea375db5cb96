//! In-process store.
//!
//! Each successful upload builds a new immutable [`Generation`] and swaps it into the slot.
//! Readers clone the `Arc` once and keep reading the generation they started with, even if an
//! upload lands in between.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::StoreResult;
use crate::query::RowFilter;
use crate::types::{CsvUpload, FileDescriptor, Row};

use super::{CsvStore, Snapshot};

#[derive(Debug)]
struct Generation {
    file: FileDescriptor,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct IdCounters {
    last_file_id: i64,
    last_row_id: i64,
}

/// Non-persistent [`CsvStore`]. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RwLock<Option<Arc<Generation>>>,
    ids: Mutex<IdCounters>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CsvStore for MemoryStore {
    fn replace(&self, upload: &CsvUpload) -> StoreResult<FileDescriptor> {
        let generation = {
            let mut ids = self.ids.lock()?;
            ids.last_file_id += 1;
            let file_id = ids.last_file_id;

            let rows: Vec<Row> = upload
                .rows
                .iter()
                .map(|data| {
                    ids.last_row_id += 1;
                    Row {
                        id: ids.last_row_id,
                        file_id,
                        data: data.clone(),
                    }
                })
                .collect();

            Generation {
                file: FileDescriptor {
                    id: file_id,
                    file_name: upload.file_name.clone(),
                    headers: upload.headers.clone(),
                    row_count: rows.len() as u64,
                },
                rows,
            }
        };

        let file = generation.file.clone();
        *self.slot.write()? = Some(Arc::new(generation));
        Ok(file)
    }

    fn snapshot(&self) -> StoreResult<Box<dyn Snapshot + '_>> {
        let pinned = self.slot.read()?.clone();
        Ok(Box::new(MemorySnapshot { pinned }))
    }
}

struct MemorySnapshot {
    pinned: Option<Arc<Generation>>,
}

impl MemorySnapshot {
    fn matching<'a>(&'a self, filter: &'a RowFilter) -> impl Iterator<Item = &'a Row> + 'a {
        self.pinned
            .iter()
            .flat_map(|g| g.rows.iter())
            .filter(move |row| filter.matches(&row.data))
    }
}

impl Snapshot for MemorySnapshot {
    fn file(&self) -> Option<&FileDescriptor> {
        self.pinned.as_ref().map(|g| &g.file)
    }

    fn count(&self, filter: &RowFilter) -> StoreResult<u64> {
        Ok(self.matching(filter).count() as u64)
    }

    fn rows(&self, filter: &RowFilter, offset: u64, limit: u32) -> StoreResult<Vec<Row>> {
        // Rows are kept in insertion order, which is ascending id order.
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(self
            .matching(filter)
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
