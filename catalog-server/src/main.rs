//! catalog-server - Collectible catalog JSON service
//!
//! Startup order: tracing, configuration, database, session cleanup,
//! optional seeding, then the HTTP server until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use catalog_common::config::ServerConfig;
use catalog_common::db::init_database;
use catalog_server::cli::Args;
use catalog_server::db::sessions::purge_expired;
use catalog_server::seed::{apply_seed, load_seed_file};
use catalog_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise start at info and switch to the configured level
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let initial_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, filter_handle) = reload::Layer::new(initial_filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database delays
    info!(
        "Starting Collectible Catalog (catalog-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServerConfig::resolve(args.into_overrides());

    if !rust_log_set {
        match EnvFilter::try_new(&config.log_level) {
            Ok(filter) => {
                if let Err(e) = filter_handle.reload(filter) {
                    warn!("Failed to apply log level '{}': {}", config.log_level, e);
                }
            }
            Err(e) => warn!("Invalid log level '{}': {}", config.log_level, e),
        }
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    if let Err(e) = purge_expired(&pool).await {
        warn!("Failed to purge expired sessions: {}", e);
    }

    if let Some(seed_path) = &config.seed_file {
        info!("Applying seed file {}", seed_path.display());
        let seed = load_seed_file(seed_path)
            .with_context(|| format!("Failed to read seed file {}", seed_path.display()))?;
        apply_seed(&pool, &seed).await.context("Failed to apply seed file")?;
    }

    let state = AppState::load(pool)
        .await
        .context("Failed to load runtime settings")?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return Err(e).context("Failed to bind to address");
        }
    };
    info!("catalog-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
