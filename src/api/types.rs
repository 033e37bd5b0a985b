use serde::{Deserialize, Serialize};

use crate::db::repositories::user::User;
use crate::entities::replies::{self, ReplyStatus};
use crate::entities::threads::{self, ThreadStatus};
use crate::entities::users::Role;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// User record as exposed over the API. The password hash is not part of
/// this shape, so it can never leak into a response body.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id: i32,
    pub uuid: String,
    pub username: String,
    pub role: Role,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            uuid: user.uuid,
            username: user.username,
            role: user.role,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadDto {
    pub thread_id: i32,
    pub title: String,
    pub content: String,
    pub user_id: i32,
    pub status: ThreadStatus,
    pub reply_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ThreadDto {
    #[must_use]
    pub fn from_model(model: threads::Model, reply_count: i64) -> Self {
        Self {
            thread_id: model.thread_id,
            title: model.title,
            content: model.content,
            user_id: model.user_id,
            status: model.status,
            reply_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyDto {
    pub reply_id: i32,
    pub thread_id: i32,
    pub user_id: i32,
    pub content: String,
    pub status: ReplyStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<replies::Model> for ReplyDto {
    fn from(model: replies::Model) -> Self {
        Self {
            reply_id: model.reply_id,
            thread_id: model.thread_id,
            user_id: model.user_id,
            content: model.content,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: Option<i32>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThreadRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    #[serde(default)]
    pub content: String,
    pub user_id: Option<i32>,
}
