pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::StoreBackend;
use cli::{Cli, Commands};
pub use config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { memory_store }) => {
            let backend = if memory_store {
                StoreBackend::Memory
            } else {
                StoreBackend::Appwrite
            };
            run_daemon(config, backend).await
        }

        Some(Commands::Search { query }) => cli::cmd_search_movies(&config, &query.join(" ")).await,

        Some(Commands::Trending) => cli::cmd_trending(&config).await,

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_daemon(config: Config, backend: StoreBackend) -> anyhow::Result<()> {
    config
        .validate(backend == StoreBackend::Appwrite)
        .context("Invalid configuration")?;

    info!(
        "Cinetrend v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

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

    let server = config.server.clone();
    let state = api::create_app_state(config, backend, prometheus_handle).await?;

    let server_handle: Option<tokio::task::JoinHandle<()>> = if server.enabled {
        let app = api::router(state.clone());
        let addr = format!("0.0.0.0:{}", server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        Some(tokio::spawn(async move {
            info!("Web Server running at http://{}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    state.shutdown();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
