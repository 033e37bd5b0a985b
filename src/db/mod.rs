use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{replies, threads};

pub mod migrator;
pub mod repositories;
mod seed;

pub use repositories::reply::NewReply;
pub use repositories::thread::{NewThread, ThreadPatch};
pub use repositories::user::{NewUser, User, UserPatch};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // File-backed sqlite needs the file and its directory to exist
        if let Some(path_str) = db_url.strip_prefix("sqlite:")
            && !path_str.starts_with(":memory:")
            && !path_str.contains("mode=memory")
        {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn thread_repo(&self) -> repositories::thread::ThreadRepository {
        repositories::thread::ThreadRepository::new(self.conn.clone())
    }

    fn reply_repo(&self) -> repositories::reply::ReplyRepository {
        repositories::reply::ReplyRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn create_user(&self, new: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().insert(new, security).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn user_exists(&self, id: i32) -> Result<bool> {
        self.user_repo().exists_by_id(id).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, patch, security).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn record_user_login(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().record_login(username).await
    }

    pub async fn delete_user_cascade(&self, id: i32) -> Result<u64> {
        self.user_repo().delete_cascade(id).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========== Thread Repository Methods ==========

    pub async fn create_thread(&self, new: NewThread) -> Result<threads::Model> {
        self.thread_repo().insert(new).await
    }

    pub async fn get_thread(&self, id: i32) -> Result<Option<threads::Model>> {
        self.thread_repo().get(id).await
    }

    pub async fn thread_exists(&self, id: i32) -> Result<bool> {
        self.thread_repo().exists(id).await
    }

    pub async fn list_threads(&self) -> Result<Vec<threads::Model>> {
        self.thread_repo().list().await
    }

    pub async fn reply_counts_for_threads(
        &self,
        thread_ids: &[i32],
    ) -> Result<std::collections::HashMap<i32, i64>> {
        self.thread_repo().reply_counts(thread_ids).await
    }

    pub async fn update_thread(
        &self,
        id: i32,
        patch: ThreadPatch,
    ) -> Result<Option<threads::Model>> {
        self.thread_repo().update(id, patch).await
    }

    pub async fn delete_thread_cascade(&self, id: i32) -> Result<bool> {
        self.thread_repo().delete_cascade(id).await
    }

    pub async fn count_threads(&self) -> Result<u64> {
        self.thread_repo().count().await
    }

    // ========== Reply Repository Methods ==========

    pub async fn create_reply(&self, new: NewReply) -> Result<replies::Model> {
        self.reply_repo().insert(new).await
    }

    pub async fn get_reply(&self, id: i32) -> Result<Option<replies::Model>> {
        self.reply_repo().get(id).await
    }

    pub async fn list_replies_for_thread(&self, thread_id: i32) -> Result<Vec<replies::Model>> {
        self.reply_repo().list_for_thread(thread_id).await
    }

    pub async fn soft_delete_reply(&self, id: i32) -> Result<Option<replies::Model>> {
        self.reply_repo().soft_delete(id).await
    }

    pub async fn count_replies(&self) -> Result<u64> {
        self.reply_repo().count().await
    }
}
