use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, InputAccepted, InputRequest, SearchParams};
use crate::models::{Movie, ViewState};

/// Runs a lookup immediately, bypassing the debounce.
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<Movie>>>, ApiError> {
    let movies = state.orchestrator.search(&params.query).await?;
    Ok(Json(ApiResponse::success(movies)))
}

/// Feeds one keystroke value into the debounced search pipeline.
pub async fn push_input(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InputRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InputAccepted>>), ApiError> {
    state.orchestrator.input(request.value.clone()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(InputAccepted {
            value: request.value,
        })),
    ))
}

pub async fn view_state(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ViewState>> {
    Json(ApiResponse::success(state.orchestrator.snapshot().await))
}
