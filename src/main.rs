use std::error::Error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use csv_search::config::Config;
use csv_search::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let store = config.open_store()?;
    tokio::fs::create_dir_all(config.upload_dir()).await?;

    let app = server::router(store, &config);
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        store = ?config.store,
        upload_dir = %config.upload_dir().display(),
        "server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => {
            tracing::warn!(error = %err, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await
        }
    }
}
