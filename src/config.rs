//! Server configuration.
//!
//! Every option can be given as a command-line flag or an environment variable. [`Config`]
//! also implements [`Default`] for library and test use.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::error::StoreResult;
use crate::ingestion::{
    CompositeObserver, FileObserver, IngestionObserver, IngestionOptions, IngestionSeverity, TracingObserver,
};
use crate::store::{CsvStore, MemoryStore, SqliteStore};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATABASE: &str = "csv-search.db";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Which [`CsvStore`] backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreKind {
    /// Persistent SQLite database at `--database`.
    #[default]
    Sqlite,
    /// In-process store; contents are lost on restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(author, version, about = "Upload one CSV file and search its rows over HTTP", long_about = None)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "BIND_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "STORE_KIND", value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// SQLite database file (ignored by the memory store).
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Directory for spooled uploads. Defaults to the OS temp dir.
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Allowed CORS origins (comma-separated). Empty allows any origin.
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Append ingestion outcomes to this file.
    #[arg(long = "ingest-log", env = "INGEST_LOG")]
    pub ingest_log: Option<PathBuf>,

    /// Failures at or above this severity are raised as alerts.
    #[arg(long, env = "ALERT_LEVEL", value_enum, default_value_t = IngestionSeverity::Critical)]
    pub alert_level: IngestionSeverity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            store: StoreKind::default(),
            database: PathBuf::from(DEFAULT_DATABASE),
            upload_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: Vec::new(),
            ingest_log: None,
            alert_level: IngestionSeverity::Critical,
        }
    }
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Open the configured store.
    pub fn open_store(&self) -> StoreResult<Arc<dyn CsvStore>> {
        Ok(match self.store {
            StoreKind::Sqlite => Arc::new(SqliteStore::open(&self.database)?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        })
    }

    /// Observers and alert threshold for the ingestion pipeline.
    pub fn ingestion_options(&self) -> IngestionOptions {
        let tracing_observer: Arc<dyn IngestionObserver> = Arc::new(TracingObserver);
        let mut observers = CompositeObserver::new(vec![tracing_observer]);
        if let Some(path) = &self.ingest_log {
            observers.push(Arc::new(FileObserver::new(path)));
        }
        let observer: Arc<dyn IngestionObserver> = Arc::new(observers);
        IngestionOptions {
            observer: Some(observer),
            alert_at_or_above: self.alert_level,
        }
    }
}
