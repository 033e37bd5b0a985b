//! System endpoints: liveness probe and an aggregate status view.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub database: bool,
    pub users: u64,
    pub threads: u64,
    pub replies: u64,
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatusResponse>>, ApiError> {
    let database = state.store().ping().await.is_ok();

    let users = state
        .store()
        .count_users()
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;
    let threads = state
        .store()
        .count_threads()
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;
    let replies = state
        .store()
        .count_replies()
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    Ok(Json(ApiResponse::success(SystemStatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database,
        users,
        threads,
        replies,
    })))
}
