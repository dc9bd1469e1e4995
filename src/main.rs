use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom::cli::{run_command, Cli};
use stockroom::config::Config;
use stockroom::store::{InventoryStore, SqliteStore};
use stockroom::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging: RUST_LOG wins, then --log-level, then the config file
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !cli.is_serve() {
        return run_command(&cli, &config).await;
    }

    serve(config).await
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting Stockroom v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database
    let db = stockroom::db::init(&config.server.data_dir, &config.database).await?;
    let store: Arc<dyn InventoryStore> = Arc::new(SqliteStore::new(db));

    // Ensure the configured staff account exists
    stockroom::api::auth::ensure_bootstrap_user(store.as_ref(), &config.auth).await?;

    // Create app state with the initial snapshot
    let state = Arc::new(AppState::load(config.clone(), store).await?);
    {
        let snapshot = state.inventory.snapshot();
        tracing::info!(
            items = snapshot.items.len(),
            orders = snapshot.orders.len(),
            missing_reports = snapshot.missing_reports.len(),
            "Inventory loaded"
        );
    }

    let api_router = stockroom::api::create_router(state.clone());

    // Serve a built front-end as fallback when configured
    let app = match &config.server.static_dir {
        Some(dir) => {
            tracing::info!("Serving static files from {}", dir.display());
            api_router.fallback_service(ServeDir::new(dir))
        }
        None => api_router,
    };

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
