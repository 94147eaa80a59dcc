use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docstore::config::AppConfig;
use docstore::ingest::RemoteFetcher;
use docstore::serializer::WriteSerializer;
use docstore::service::DocumentService;
use docstore::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let blobs = FilesystemBlobStore::new(
        config.storage.data_path.clone(),
        config.storage.max_blob_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open blob store at {}",
            config.storage.data_path.display()
        )
    })?;
    info!(path = %config.storage.data_path.display(), "Blob store ready");

    let db = docstore::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database schema synchronized");

    let fetcher = RemoteFetcher::new(Duration::from_secs(config.fetch.timeout_secs))
        .context("Failed to build remote fetcher")?;

    let service = DocumentService::new(
        db,
        Arc::new(blobs),
        Arc::new(WriteSerializer::new()),
        fetcher,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { service, config };
    let app = docstore::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
