use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod events;
mod observability;
mod search;
mod system;
mod trending;
mod types;

pub use error::ApiError;
pub use types::*;

use crate::clients::appwrite::AppwriteClient;
use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::db::{AppwriteTrendingRepository, MemoryTrendingRepository, TrendingRepository};
use crate::models::PosterUri;
use crate::services::orchestrator::OrchestratorTasks;
use crate::services::{MovieCatalog, QueryOrchestrator, SearchService, TrendingService};
use metrics_exporter_prometheus::PrometheusHandle;

/// Where trending records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Appwrite,
    Memory,
}

pub struct AppState {
    pub config: Config,

    pub orchestrator: QueryOrchestrator,

    pub trending: Arc<TrendingService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,

    tasks: OrchestratorTasks,
}

impl AppState {
    /// Stops the orchestrator's background tasks.
    pub fn shutdown(&self) {
        self.tasks.abort();
    }
}

/// Builds the upstream clients named by `config` and starts the orchestrator.
pub async fn create_app_state(
    config: Config,
    backend: StoreBackend,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let catalog = Arc::new(TmdbClient::new(&config.tmdb)?);

    let repository: Arc<dyn TrendingRepository> = match backend {
        StoreBackend::Appwrite => Arc::new(AppwriteTrendingRepository::new(AppwriteClient::new(
            &config.appwrite,
        )?)),
        StoreBackend::Memory => {
            info!("Trending records are kept in memory and lost on exit");
            Arc::new(MemoryTrendingRepository::new())
        }
    };

    create_app_state_with(config, catalog, repository, prometheus_handle).await
}

/// Like [`create_app_state`], with the collaborators supplied by the caller.
pub async fn create_app_state_with(
    config: Config,
    catalog: Arc<dyn MovieCatalog>,
    repository: Arc<dyn TrendingRepository>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let trending = Arc::new(TrendingService::new(
        repository,
        PosterUri::from_config(&config.tmdb),
    ));

    let orchestrator = QueryOrchestrator::new(
        SearchService::new(catalog),
        trending.clone(),
        config.search.debounce(),
        config.general.event_bus_buffer_size,
    );
    let tasks = orchestrator.start().await?;

    Ok(Arc::new(AppState {
        config,
        orchestrator,
        trending,
        start_time: std::time::Instant::now(),
        prometheus_handle,
        tasks,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config.server.cors_allowed_origins;

    let api_router = Router::new()
        .route("/health", get(system::health))
        .route("/search", get(search::search_movies))
        .route("/input", post(search::push_input))
        .route("/state", get(search::view_state))
        .route(
            "/trending",
            get(trending::top_trending).post(trending::record_trending),
        )
        .route("/trending/refresh", post(trending::refresh_trending))
        .route("/events", get(events::sse_handler))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
