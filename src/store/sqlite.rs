//! SQLite-backed store.
//!
//! Schema:
//!
//! - `csv_files(id, file_name, headers, row_count)`: at most one row; `headers` is a JSON array.
//! - `csv_rows(id, file_id, data)`: `data` is a JSON object keyed by header name.
//!
//! Both tables use `AUTOINCREMENT` so ids are never reused across uploads. Column filters are
//! evaluated with `json_each` over the row object, which keeps arbitrary header names out of
//! JSON path syntax.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};

use crate::error::{StoreError, StoreResult};
use crate::query::RowFilter;
use crate::types::{CsvUpload, FileDescriptor, Row, RowData};

use super::{CsvStore, Snapshot};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS csv_files (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT    NOT NULL,
    headers   TEXT    NOT NULL,
    row_count INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS csv_rows (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES csv_files(id) ON DELETE CASCADE,
    data    TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_csv_rows_file_id ON csv_rows(file_id, id);
";

/// Persistent [`CsvStore`] on a single SQLite connection.
///
/// Access is serialized through a mutex; each replace is one `IMMEDIATE` transaction and each
/// snapshot holds a read transaction until dropped.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let journal: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %journal, "opened sqlite store");
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CsvStore for SqliteStore {
    fn replace(&self, upload: &CsvUpload) -> StoreResult<FileDescriptor> {
        let headers_json = serde_json::to_string(&upload.headers)?;
        let row_count = upload.rows.len() as u64;

        let mut conn = self.conn.lock()?;
        // Dropping `tx` without commit rolls back, leaving the previous file in place.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM csv_rows", [])?;
        tx.execute("DELETE FROM csv_files", [])?;
        tx.execute(
            "INSERT INTO csv_files (file_name, headers, row_count) VALUES (?1, ?2, ?3)",
            params![upload.file_name, headers_json, row_count as i64],
        )?;
        let file_id = tx.last_insert_rowid();
        {
            let mut insert = tx.prepare("INSERT INTO csv_rows (file_id, data) VALUES (?1, ?2)")?;
            for data in &upload.rows {
                insert.execute(params![file_id, serde_json::to_string(data)?])?;
            }
        }
        tx.commit()?;

        Ok(FileDescriptor {
            id: file_id,
            file_name: upload.file_name.clone(),
            headers: upload.headers.clone(),
            row_count,
        })
    }

    fn snapshot(&self) -> StoreResult<Box<dyn Snapshot + '_>> {
        let conn = self.conn.lock()?;
        conn.execute_batch("BEGIN DEFERRED")?;
        // From here on, dropping `snapshot` ends the read transaction.
        let mut snapshot = SqliteSnapshot { conn, file: None };
        snapshot.file = load_file(&snapshot.conn)?;
        Ok(Box::new(snapshot))
    }
}

fn load_file(conn: &Connection) -> StoreResult<Option<FileDescriptor>> {
    let raw = conn
        .query_row(
            "SELECT id, file_name, headers, row_count FROM csv_files ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, file_name, headers, row_count)) = raw else {
        return Ok(None);
    };
    let row_count = u64::try_from(row_count).map_err(|_| StoreError::Corrupt {
        message: format!("negative row_count {row_count} for file {id}"),
    })?;
    Ok(Some(FileDescriptor {
        id,
        file_name,
        headers: serde_json::from_str(&headers)?,
        row_count,
    }))
}

struct SqliteSnapshot<'a> {
    conn: MutexGuard<'a, Connection>,
    file: Option<FileDescriptor>,
}

impl SqliteSnapshot<'_> {
    /// `WHERE` clause and its arguments for rows of the pinned file that match `filter`.
    fn predicate(&self, file_id: i64, filter: &RowFilter) -> (&'static str, Vec<SqlValue>) {
        let mut args = vec![SqlValue::Integer(file_id)];
        let clause = match filter {
            RowFilter::MatchAll => "file_id = ?1",
            RowFilter::Equals { column, value } => {
                args.push(SqlValue::Text(column.clone()));
                args.push(SqlValue::Text(value.clone()));
                "file_id = ?1 AND EXISTS (SELECT 1 FROM json_each(csv_rows.data) AS cell \
                 WHERE cell.key = ?2 AND cell.value = ?3)"
            }
            RowFilter::Contains { column, value } => {
                args.push(SqlValue::Text(column.clone()));
                args.push(SqlValue::Text(value.clone()));
                "file_id = ?1 AND EXISTS (SELECT 1 FROM json_each(csv_rows.data) AS cell \
                 WHERE cell.key = ?2 AND instr(cell.value, ?3) > 0)"
            }
        };
        (clause, args)
    }
}

impl Snapshot for SqliteSnapshot<'_> {
    fn file(&self) -> Option<&FileDescriptor> {
        self.file.as_ref()
    }

    fn count(&self, filter: &RowFilter) -> StoreResult<u64> {
        let Some(file) = &self.file else {
            return Ok(0);
        };
        let (clause, args) = self.predicate(file.id, filter);
        let sql = format!("SELECT COUNT(*) FROM csv_rows WHERE {clause}");
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;
        Ok(n as u64)
    }

    fn rows(&self, filter: &RowFilter, offset: u64, limit: u32) -> StoreResult<Vec<Row>> {
        let Some(file) = &self.file else {
            return Ok(Vec::new());
        };
        let (clause, mut args) = self.predicate(file.id, filter);
        let limit_idx = args.len() + 1;
        args.push(SqlValue::Integer(i64::from(limit)));
        args.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        let sql = format!(
            "SELECT id, file_id, data FROM csv_rows WHERE {clause} \
             ORDER BY id ASC LIMIT ?{limit_idx} OFFSET ?{}",
            limit_idx + 1
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut out = Vec::with_capacity(limit.min(1_024) as usize);
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        while let Some(row) = rows.next()? {
            let data: String = row.get(2)?;
            out.push(Row {
                id: row.get(0)?,
                file_id: row.get(1)?,
                data: serde_json::from_str::<RowData>(&data)?,
            });
        }
        Ok(out)
    }
}

impl Drop for SqliteSnapshot<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.conn.execute_batch("COMMIT") {
            tracing::warn!(error = %err, "failed to close read transaction");
        }
    }
}
