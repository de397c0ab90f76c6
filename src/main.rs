use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use forkchat::infrastructure::observability::{TracingConfig, init_tracing};
use forkchat::infrastructure::persistence::RepositoryFactory;
use forkchat::infrastructure::storage::FileStoreFactory;
use forkchat::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(
        TracingConfig::from_settings(environment, &settings.logging),
        "server",
    );

    let repositories = RepositoryFactory::create(&settings.database)
        .await
        .context("Failed to initialise repositories")?;
    let file_store =
        FileStoreFactory::create(&settings.storage).context("Failed to initialise file store")?;

    let router = create_router(AppState::new(repositories, file_store));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!(%addr, environment = %environment, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
