use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::SqlErr;
use std::sync::Arc;

use super::types::{
    CreateUserRequest, LoginRequest, LoginResponse, MessageResponse, UpdateUserRequest, UserDto,
};
use super::validation::{parse_user_id, validate_password, validate_user_id, validate_username};
use super::{ApiError, ApiResponse, AppState};
use crate::db::{NewUser, UserPatch};
use crate::entities::users::Role;

// ============================================================================
// Handlers
// ============================================================================

/// POST /users
/// Create an account. The guards run in a fixed order so each failure mode
/// keeps its own message; the required-field check comes first, which means
/// a missing password can never reach the hasher.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() || payload.role.is_empty() {
        return Err(ApiError::validation(
            "Username, password, and role are required",
        ));
    }

    if payload.username.chars().count() > 20 || payload.password.chars().count() > 30 {
        return Err(ApiError::validation(
            "Username must be at most 20 characters and password at most 30 characters",
        ));
    }

    if !payload.username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation(
            "Username must not contain special characters",
        ));
    }

    if payload.username.chars().count() < 3 || payload.password.chars().count() < 4 {
        return Err(ApiError::validation(
            "Username must be at least 3 characters and password at least 4 characters",
        ));
    }

    let Some(role) = Role::parse(&payload.role) else {
        return Err(ApiError::validation(
            "Role must be one of admin, moderator, or member",
        ));
    };

    // Explicit IDs get a pre-check; the unique index still arbitrates races
    if let Some(id) = payload.user_id
        && state
            .store()
            .user_exists(id)
            .await
            .map_err(|e| ApiError::database(e.to_string()))?
    {
        return Err(ApiError::validation("User with this ID already exists"));
    }

    let new = NewUser {
        user_id: payload.user_id,
        username: payload.username,
        password: payload.password,
        role,
    };

    let user = match state.store().create_user(new, &state.config.security).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(
                ApiError::sql_err(&e),
                Some(SqlErr::UniqueConstraintViolation(_))
            ) {
                return Err(ApiError::validation("Username is already taken"));
            }
            return Err(ApiError::database(e.to_string()));
        }
    };

    tracing::info!("Created user {} (ID: {})", user.username, user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_user_id(&raw_id)?;

    let user = state
        .store()
        .get_user_by_id(id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}
/// Partial update; supplied fields are validated with the helper-level
/// rules, a supplied password is re-hashed before it is stored.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = parse_user_id(&raw_id)?;

    let mut patch = UserPatch::default();

    if let Some(username) = payload.username {
        if !validate_username(&username) {
            return Err(ApiError::validation(
                "Username must be between 3 and 20 characters",
            ));
        }
        patch.username = Some(username);
    }

    if let Some(password) = payload.password {
        if !validate_password(&password) {
            return Err(ApiError::validation(
                "Password must be between 8 and 50 characters",
            ));
        }
        patch.password = Some(password);
    }

    if let Some(role) = payload.role {
        let Some(role) = Role::parse(&role) else {
            return Err(ApiError::validation(
                "Role must be one of admin, moderator, or member",
            ));
        };
        patch.role = Some(role);
    }

    if patch.is_empty() {
        return Err(ApiError::validation("At least one field is required"));
    }

    let updated = match state
        .store()
        .update_user(id, patch, &state.config.security)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            if matches!(
                ApiError::sql_err(&e),
                Some(SqlErr::UniqueConstraintViolation(_))
            ) {
                return Err(ApiError::validation("Username is already taken"));
            }
            return Err(ApiError::database(e.to_string()));
        }
    };

    let user = updated.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /users/{id}
/// Removes the user together with their threads and replies in one
/// transaction. A foreign-key violation that still surfaces maps to 409.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_user_id(&raw_id)?;

    let exists = state
        .store()
        .user_exists(id)
        .await
        .map_err(|e| ApiError::database(e.to_string()))?;

    if !exists {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    match state.store().delete_user_cascade(id).await {
        Ok(0) => Err(ApiError::NotFound("User not found".to_string())),
        Ok(_) => {
            tracing::info!("Deleted user {id} and their threads and replies");
            Ok(Json(ApiResponse::success(MessageResponse {
                message: "User deleted successfully".to_string(),
            })))
        }
        Err(e) => {
            if matches!(
                ApiError::sql_err(&e),
                Some(SqlErr::ForeignKeyConstraintViolation(_))
            ) {
                return Err(ApiError::conflict("Cannot delete user with related records"));
            }
            Err(ApiError::database(e.to_string()))
        }
    }
}

/// POST /users/login
/// The 401 message is identical whether the username or the password was
/// wrong; a successful login stamps `last_login`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() && payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = state
        .store()
        .record_user_login(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to record login: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(ApiResponse::success(LoginResponse {
        message: "Login successful".to_string(),
        user: UserDto::from(user),
    })))
}
