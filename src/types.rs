//! Core data model types.
//!
//! The store holds at most one [`FileDescriptor`] (the "file slot") together with the [`Row`]s
//! parsed from that file. Ingestion produces a [`CsvUpload`]; the query engine produces a
//! [`SearchPage`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One data line of a CSV file, keyed by header name.
///
/// Duplicate header names collapse into a single key (the right-most column wins).
pub type RowData = BTreeMap<String, String>;

/// Metadata for the CSV file currently occupying the file slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Store-assigned identifier. Increases on every successful upload.
    pub id: i64,
    /// Original file name as sent by the client.
    pub file_name: String,
    /// Column names in file order. Uniqueness is not enforced.
    pub headers: Vec<String>,
    /// Number of rows referencing this descriptor.
    pub row_count: u64,
}

impl FileDescriptor {
    /// Returns `true` if `column` is one of this file's headers.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// A stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Store-assigned, monotonically increasing. Results are always ordered by it.
    pub id: i64,
    /// Back-reference to the owning [`FileDescriptor::id`].
    pub file_id: i64,
    pub data: RowData,
}

/// A fully validated CSV file, ready to replace the current file slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub file_name: String,
    pub headers: Vec<String>,
    /// Data rows in file order. Never empty once validation has passed.
    pub rows: Vec<RowData>,
}

impl CsvUpload {
    /// Number of data rows (header line excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Headers of the file the page was read from.
    pub headers: Vec<String>,
    /// Number of rows matching the filter, independent of the page window.
    pub total_count: u64,
    pub data_entries: Vec<Row>,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_serializes_with_camel_case_keys() {
        let page = SearchPage {
            headers: vec!["name".to_string()],
            total_count: 1,
            data_entries: vec![Row {
                id: 7,
                file_id: 3,
                data: RowData::from([("name".to_string(), "Ada".to_string())]),
            }],
            page: 1,
            limit: 10,
        };

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["dataEntries"][0]["id"], 7);
        assert_eq!(json["dataEntries"][0]["fileId"], 3);
        assert_eq!(json["dataEntries"][0]["data"]["name"], "Ada");
    }

    #[test]
    fn has_column_is_case_sensitive() {
        let file = FileDescriptor {
            id: 1,
            file_name: "people.csv".to_string(),
            headers: vec!["name".to_string(), "age".to_string()],
            row_count: 0,
        };
        assert!(file.has_column("age"));
        assert!(!file.has_column("Age"));
    }
}
