pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tower_sessions::ExpiredDeletion;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

/// Entry point once the runtime is up. `source` is the config file that
/// `config` was read from, if any.
pub async fn run(config: Config, source: Option<PathBuf>) -> anyhow::Result<()> {
    let cli = Cli::parse();

    config.validate()?;

    init_tracing(&config);

    match &source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Init => cli::cmd_init(),
        Commands::Gifts => cli::cmd_list_gifts(&config).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Wishlist v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    tokio::fs::create_dir_all(&config.general.uploads_path)
        .await
        .with_context(|| {
            format!(
                "Failed to create uploads directory {}",
                config.general.uploads_path
            )
        })?;

    let addr = config.bind_address();
    let shared = std::sync::Arc::new(SharedState::new(config).await?);

    let sweeper = tokio::spawn(
        shared
            .session_store
            .clone()
            .continuously_delete_expired(constants::intervals::EXPIRED_SESSION_SWEEP),
    );

    let app = api::router(api::create_app_state(shared, prometheus_handle));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    sweeper.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
