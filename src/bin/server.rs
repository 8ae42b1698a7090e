use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cep_form::server::build_app;
use cep_form::{AppConfig, FileStorage, FormController, LocalStore, LogNotifier, ViaCepClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,cep_form=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "Storage: {} (key {}), lookup: {}",
        config.storage_dir.display(),
        config.storage_key,
        config.lookup_base_url
    );

    let lookup = ViaCepClient::with_base_url(&config.lookup_base_url)
        .context("Failed to initialize lookup client")?;
    let store = LocalStore::with_key(
        FileStorage::new(config.storage_dir.clone()),
        config.storage_key.clone(),
    );
    let controller = Arc::new(FormController::new(store, lookup, LogNotifier));

    // The page-load event: restore whatever was saved last time
    let report = controller.on_load().await;
    tracing::info!("Form restored, startup lookup: {:?}", report);

    let app = build_app(controller);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
