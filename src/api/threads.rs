use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::types::{CreateThreadRequest, MessageResponse, ThreadDto, UpdateThreadRequest};
use super::validation::{validate_thread_content, validate_thread_id, validate_thread_title};
use super::{ApiError, ApiResponse, AppState};
use crate::db::{NewThread, ThreadPatch};
use crate::entities::threads::ThreadStatus;

/// GET /threads
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ThreadDto>>>, ApiError> {
    let threads = state
        .store()
        .list_threads()
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    let thread_ids: Vec<i32> = threads.iter().map(|t| t.thread_id).collect();
    let counts = state
        .store()
        .reply_counts_for_threads(&thread_ids)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    let dtos = threads
        .into_iter()
        .map(|thread| {
            let reply_count = counts.get(&thread.thread_id).copied().unwrap_or(0);
            ThreadDto::from_model(thread, reply_count)
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /threads
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ThreadDto>>), ApiError> {
    let Some(user_id) = payload.user_id else {
        return Err(ApiError::validation("User ID is required"));
    };

    if !validate_thread_title(&payload.title) {
        return Err(ApiError::validation(
            "Title must be between 5 and 50 characters",
        ));
    }

    if !validate_thread_content(&payload.content) {
        return Err(ApiError::validation(
            "Content must be between 10 and 500 characters",
        ));
    }

    let author_exists = state
        .store()
        .user_exists(user_id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !author_exists {
        return Err(ApiError::validation("User not found"));
    }

    let thread = state
        .store()
        .create_thread(NewThread {
            title: payload.title.trim().to_string(),
            content: payload.content.trim().to_string(),
            user_id,
        })
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    tracing::info!("Created thread {} by user {}", thread.thread_id, user_id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ThreadDto::from_model(thread, 0))),
    ))
}

/// GET /threads/{id}
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ThreadDto>>, ApiError> {
    let id = validate_thread_id(id)?;

    let thread = state
        .store()
        .get_thread(id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Thread", id))?;

    let counts = state
        .store()
        .reply_counts_for_threads(&[id])
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;
    let reply_count = counts.get(&id).copied().unwrap_or(0);

    Ok(Json(ApiResponse::success(ThreadDto::from_model(
        thread,
        reply_count,
    ))))
}

/// PUT /threads/{id}
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateThreadRequest>,
) -> Result<Json<ApiResponse<ThreadDto>>, ApiError> {
    let id = validate_thread_id(id)?;

    let mut patch = ThreadPatch::default();

    if let Some(title) = payload.title {
        if !validate_thread_title(&title) {
            return Err(ApiError::validation(
                "Title must be between 5 and 50 characters",
            ));
        }
        patch.title = Some(title.trim().to_string());
    }

    if let Some(content) = payload.content {
        if !validate_thread_content(&content) {
            return Err(ApiError::validation(
                "Content must be between 10 and 500 characters",
            ));
        }
        patch.content = Some(content.trim().to_string());
    }

    if let Some(status) = payload.status {
        let Some(status) = ThreadStatus::parse(&status) else {
            return Err(ApiError::validation(
                "Status must be one of open, closed, or archived",
            ));
        };
        patch.status = Some(status);
    }

    if patch.is_empty() {
        return Err(ApiError::validation("At least one field is required"));
    }

    let thread = state
        .store()
        .update_thread(id, patch)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Thread", id))?;

    let counts = state
        .store()
        .reply_counts_for_threads(&[id])
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;
    let reply_count = counts.get(&id).copied().unwrap_or(0);

    Ok(Json(ApiResponse::success(ThreadDto::from_model(
        thread,
        reply_count,
    ))))
}

/// DELETE /threads/{id}
/// Replies in the thread are removed in the same transaction.
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_thread_id(id)?;

    let deleted = state
        .store()
        .delete_thread_cascade(id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !deleted {
        return Err(ApiError::not_found("Thread", id));
    }

    tracing::info!("Deleted thread {id} and its replies");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Thread deleted successfully".to_string(),
    })))
}
