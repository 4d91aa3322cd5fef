use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, RecordRequest, TrendingDto};
use crate::models::TrendingRecord;
use crate::services::RecordOutcome;

/// Current leaderboard straight from the store. Empty when the store is
/// unreachable.
pub async fn top_trending(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<TrendingRecord>>> {
    Json(ApiResponse::success(state.trending.top_trending().await))
}

/// Reloads the leaderboard held in view state.
pub async fn refresh_trending(State(state): State<Arc<AppState>>) -> Json<ApiResponse<TrendingDto>> {
    let records = state.orchestrator.load_trending().await;
    let error = state.orchestrator.snapshot().await.trending_error;

    Json(ApiResponse::success(TrendingDto { records, error }))
}

/// Counts a selection directly, outside the search pipeline.
pub async fn record_trending(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordRequest>,
) -> Result<Json<ApiResponse<RecordOutcome>>, ApiError> {
    let outcome = state
        .trending
        .record_selection(&request.search_term, &request.movie)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}
