use std::sync::Arc;
use std::thread;

use csv_search::QueryError;
use csv_search::ingestion::{IngestionContext, IngestionOptions, IngestionPipeline};
use csv_search::query::{QueryEngine, SearchParams};
use csv_search::store::{CsvStore, MemoryStore, SqliteStore};

fn stores() -> Vec<(&'static str, Arc<dyn CsvStore>)> {
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(SqliteStore::open_in_memory().unwrap())),
    ]
}

fn ctx(name: &str) -> IngestionContext {
    IngestionContext {
        file_name: name.to_string(),
        media_type: Some("text/csv".to_string()),
        bytes: 0,
    }
}

fn load(store: &Arc<dyn CsvStore>, csv: &str) {
    IngestionPipeline::new(store.clone(), IngestionOptions::default())
        .ingest_reader(csv.as_bytes(), &ctx("people.csv"))
        .unwrap();
}

/// Builds params the way a query string would deserialize.
fn params(pairs: &[(&str, &str)]) -> SearchParams {
    let object: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object)).unwrap()
}

fn numbered_rows(n: usize) -> String {
    let mut csv = String::from("n,label\n");
    for i in 1..=n {
        csv.push_str(&format!("{i},row{i}\n"));
    }
    csv
}

#[test]
fn search_without_upload_is_not_found() {
    for (name, store) in stores() {
        let err = QueryEngine::new(store).search(&SearchParams::default()).unwrap_err();
        assert!(matches!(err, QueryError::NotFound), "{name}");
    }
}

#[test]
fn search_without_params_returns_all_rows_in_id_order() {
    for (name, store) in stores() {
        load(&store, "name,age\nJohn,30\nJane,25\n");
        let page = QueryEngine::new(store).search(&SearchParams::default()).unwrap();

        assert_eq!(page.headers, vec!["name", "age"], "{name}");
        assert_eq!(page.total_count, 2, "{name}");
        assert_eq!((page.page, page.limit), (1, 10), "{name}");
        let names: Vec<&str> = page.data_entries.iter().map(|r| r.data["name"].as_str()).collect();
        assert_eq!(names, vec!["John", "Jane"], "{name}");
        assert!(page.data_entries[0].id < page.data_entries[1].id, "{name}");
    }
}

#[test]
fn exact_and_substring_matching() {
    for (name, store) in stores() {
        load(&store, "name,age\nJohn,30\nJane,25\n");
        let engine = QueryEngine::new(store);

        let exact = engine
            .search(&params(&[("term", "J"), ("column", "name"), ("exact", "true")]))
            .unwrap();
        assert_eq!(exact.total_count, 0, "{name}");
        assert!(exact.data_entries.is_empty(), "{name}");

        let substring = engine
            .search(&params(&[("term", "J"), ("column", "name"), ("exact", "false")]))
            .unwrap();
        assert_eq!(substring.total_count, 2, "{name}");

        let full = engine.search(&params(&[("term", "Jane"), ("column", "name")])).unwrap();
        assert_eq!(full.total_count, 1, "{name}");
        assert_eq!(full.data_entries[0].data["age"], "25", "{name}");

        let lower = engine
            .search(&params(&[("term", "j"), ("column", "name"), ("exact", "false")]))
            .unwrap();
        assert_eq!(lower.total_count, 0, "{name}");
    }
}

#[test]
fn term_is_scoped_to_its_column() {
    for (name, store) in stores() {
        load(&store, "first,second\nab,xy\nxy,ab\n");
        let page = QueryEngine::new(store)
            .search(&params(&[("term", "ab"), ("column", "second")]))
            .unwrap();
        assert_eq!(page.total_count, 1, "{name}");
        assert_eq!(page.data_entries[0].data["first"], "xy", "{name}");
    }
}

#[test]
fn invalid_input_is_rejected() {
    for (name, store) in stores() {
        load(&store, "name,age\nJohn,30\n");
        let engine = QueryEngine::new(store);

        for bad in [
            params(&[("term", "John")]),
            params(&[("term", "John"), ("column", "email")]),
        ] {
            let err = engine.search(&bad).unwrap_err();
            assert!(matches!(err, QueryError::InvalidColumn { .. }), "{name}: {bad:?}");
        }

        for bad in [
            params(&[("page", "0")]),
            params(&[("limit", "0")]),
            params(&[("limit", "ten")]),
            params(&[("page", "-2")]),
        ] {
            let err = engine.search(&bad).unwrap_err();
            assert!(matches!(err, QueryError::InvalidPage), "{name}: {bad:?}");
        }
    }
}

#[test]
fn pagination_windows_and_total_count() {
    for (name, store) in stores() {
        load(&store, &numbered_rows(100));
        let engine = QueryEngine::new(store);

        let page2 = engine.search(&params(&[("page", "2"), ("limit", "10")])).unwrap();
        assert_eq!(page2.total_count, 100, "{name}");
        let ns: Vec<&str> = page2.data_entries.iter().map(|r| r.data["n"].as_str()).collect();
        assert_eq!(ns, (11..=20).map(|i| i.to_string()).collect::<Vec<_>>(), "{name}");

        let page10 = engine.search(&params(&[("page", "10"), ("limit", "10")])).unwrap();
        assert_eq!(page10.total_count, 100, "{name}");
        assert_eq!(page10.data_entries.last().unwrap().data["n"], "100", "{name}");

        let beyond = engine.search(&params(&[("page", "11"), ("limit", "10")])).unwrap();
        assert_eq!(beyond.total_count, 100, "{name}");
        assert!(beyond.data_entries.is_empty(), "{name}");

        let partial = engine.search(&params(&[("page", "4"), ("limit", "30")])).unwrap();
        assert_eq!(partial.data_entries.len(), 10, "{name}");
    }
}

#[test]
fn filtered_pagination_counts_all_matches() {
    for (name, store) in stores() {
        load(&store, &numbered_rows(100));
        // "row1", "row10".."row19", "row100"
        let page = QueryEngine::new(store)
            .search(&params(&[
                ("term", "row1"),
                ("column", "label"),
                ("exact", "false"),
                ("page", "2"),
                ("limit", "5"),
            ]))
            .unwrap();
        assert_eq!(page.total_count, 12, "{name}");
        let ns: Vec<&str> = page.data_entries.iter().map(|r| r.data["n"].as_str()).collect();
        assert_eq!(ns, vec!["14", "15", "16", "17", "18"], "{name}");
    }
}

#[test]
fn new_upload_replaces_previous_file() {
    for (name, store) in stores() {
        load(&store, "name,age\nJohn,30\nJane,25\n");
        load(&store, "city\nOslo\n");

        let file = store.current_file().unwrap().unwrap();
        assert_eq!(file.headers, vec!["city"], "{name}");
        assert_eq!(file.row_count, 1, "{name}");

        let page = QueryEngine::new(store).search(&SearchParams::default()).unwrap();
        assert_eq!(page.total_count, 1, "{name}");
        assert!(page.data_entries.iter().all(|r| r.file_id == file.id), "{name}");
    }
}

#[test]
fn concurrent_searches_never_see_a_mixed_file() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite: Arc<dyn CsvStore> = Arc::new(SqliteStore::open(dir.path().join("race.db")).unwrap());
    let memory: Arc<dyn CsvStore> = Arc::new(MemoryStore::new());

    for store in [sqlite, memory] {
        load(&store, &numbered_rows(20));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..20 {
                    load(&store, &numbered_rows(1 + i % 7));
                }
            })
        };

        let engine = QueryEngine::new(store.clone());
        for _ in 0..50 {
            let page = engine.search(&params(&[("limit", "100")])).unwrap();
            let ids: Vec<i64> = page.data_entries.iter().map(|r| r.file_id).collect();
            assert_eq!(page.total_count as usize, ids.len());
            assert!(ids.windows(2).all(|w| w[0] == w[1]));
        }

        writer.join().unwrap();
    }
}
