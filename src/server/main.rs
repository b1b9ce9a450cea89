use prk_todo::adapters::{HttpConfig, HttpServer};
use prk_todo::config::{Backend, Config};
use prk_todo::storage::{PostgresStore, SqliteStore};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    if let Err(e) = run().await {
        #[cfg(feature = "tracing")]
        error!("Fatal error: {e:#}");
        #[cfg(not(feature = "tracing"))]
        eprintln!("Fatal error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let http = HttpConfig { addr: config.bind_addr.clone() };
    match config.backend()? {
        Backend::Postgres => {
            let store = PostgresStore::connect(&config.database_url, &config.pool).await?;
            HttpServer::new(Arc::new(store)).serve(&http).await
        }
        Backend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url, &config.pool).await?;
            HttpServer::new(Arc::new(store)).serve(&http).await
        }
    }
}
