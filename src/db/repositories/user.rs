use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QuerySelect, Set, TransactionError, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users::Role;
use crate::entities::{replies, threads, users};

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i32,
    pub uuid: String,
    pub username: String,
    pub role: Role,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            user_id: model.user_id,
            uuid: model.uuid,
            username: model.username,
            role: model.role,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Input for creating a user. The password arrives in plaintext and is
/// hashed inside the repository; it is never stored as-is.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Option<i32>,
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Partial update applied to a user row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.role.is_none()
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn exists_by_id(&self, id: i32) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .select_only()
            .column(users::Column::UserId)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await
            .context("Failed to check user existence")?;

        Ok(user.is_some())
    }

    /// Insert a new user. A duplicate username surfaces as the database's
    /// unique-constraint violation; callers map it to a client error.
    pub async fn insert(&self, new: NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new.password;
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active = users::ActiveModel {
            user_id: NotSet,
            uuid: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(new.username),
            password_hash: Set(password_hash),
            role: Set(new.role),
            last_login: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        if let Some(id) = new.user_id {
            active.user_id = Set(id);
        }

        let model = active.insert(&self.conn).await?;

        Ok(User::from(model))
    }

    /// Apply a partial update. Returns `None` when no row matched.
    /// A supplied password is re-hashed; `updated_at` is always refreshed.
    pub async fn update(
        &self,
        id: i32,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();

        if let Some(username) = patch.username {
            active.username = Set(username);
        }

        if let Some(password) = patch.password {
            let security = security.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(new_hash);
        }

        if let Some(role) = patch.role {
            active.role = Set(role);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;

        Ok(Some(User::from(model)))
    }

    /// Verify a password for a user.
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Stamp `last_login` after a successful credential check.
    pub async fn record_login(&self, username: &str) -> Result<Option<User>> {
        let Some(user) = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for login update")?
        else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(now.clone()));
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to record login")?;

        Ok(Some(User::from(model)))
    }

    /// Delete a user together with their threads and replies, as one
    /// transaction: replies in threads the user owns, replies the user
    /// authored elsewhere, the threads, then the user row. Returns the
    /// number of user rows deleted (0 or 1).
    pub async fn delete_cascade(&self, id: i32) -> Result<u64> {
        let result = self
            .conn
            .transaction::<_, u64, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let owned_threads: Vec<i32> = threads::Entity::find()
                        .select_only()
                        .column(threads::Column::ThreadId)
                        .filter(threads::Column::UserId.eq(id))
                        .into_tuple()
                        .all(txn)
                        .await?;

                    if !owned_threads.is_empty() {
                        replies::Entity::delete_many()
                            .filter(replies::Column::ThreadId.is_in(owned_threads))
                            .exec(txn)
                            .await?;
                    }

                    replies::Entity::delete_many()
                        .filter(replies::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;

                    threads::Entity::delete_many()
                        .filter(threads::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;

                    let deleted = users::Entity::delete_by_id(id).exec(txn).await?;

                    Ok(deleted.rows_affected)
                })
            })
            .await;

        match result {
            Ok(rows) => Ok(rows),
            Err(TransactionError::Connection(e) | TransactionError::Transaction(e)) => {
                Err(e.into())
            }
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count = users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        Ok(count)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
/// Each call generates a fresh random salt, so hashing the same input
/// twice produces different digests.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
