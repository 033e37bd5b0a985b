use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::types::{CreateReplyRequest, MessageResponse, ReplyDto};
use super::validation::{validate_reply_content, validate_reply_id, validate_thread_id};
use super::{ApiError, ApiResponse, AppState};
use crate::db::NewReply;

/// GET /threads/{id}/replies
pub async fn list_replies(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ReplyDto>>>, ApiError> {
    let thread_id = validate_thread_id(thread_id)?;

    let thread_exists = state
        .store()
        .thread_exists(thread_id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !thread_exists {
        return Err(ApiError::not_found("Thread", thread_id));
    }

    let replies = state
        .store()
        .list_replies_for_thread(thread_id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    let dtos = replies.into_iter().map(ReplyDto::from).collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /threads/{id}/replies
pub async fn create_reply(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<i32>,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReplyDto>>), ApiError> {
    let thread_id = validate_thread_id(thread_id)?;

    let Some(user_id) = payload.user_id else {
        return Err(ApiError::validation("User ID is required"));
    };

    if !validate_reply_content(&payload.content) {
        return Err(ApiError::validation(
            "Content must be between 5 and 300 characters",
        ));
    }

    let thread_exists = state
        .store()
        .thread_exists(thread_id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !thread_exists {
        return Err(ApiError::not_found("Thread", thread_id));
    }

    let author_exists = state
        .store()
        .user_exists(user_id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !author_exists {
        return Err(ApiError::validation("User not found"));
    }

    let reply = state
        .store()
        .create_reply(NewReply {
            thread_id,
            user_id,
            content: payload.content.trim().to_string(),
        })
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    tracing::info!(
        "Created reply {} on thread {} by user {}",
        reply.reply_id,
        thread_id,
        user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReplyDto::from(reply))),
    ))
}

/// DELETE /replies/{id}
/// Replies are soft-deleted: the row stays, its status flips to deleted.
pub async fn delete_reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_reply_id(id)?;

    let reply = state
        .store()
        .soft_delete_reply(id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if reply.is_none() {
        return Err(ApiError::not_found("Reply", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Reply deleted successfully".to_string(),
    })))
}
