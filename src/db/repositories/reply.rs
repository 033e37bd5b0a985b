use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::replies;
use crate::entities::replies::ReplyStatus;

#[derive(Debug, Clone)]
pub struct NewReply {
    pub thread_id: i32,
    pub user_id: i32,
    pub content: String,
}

pub struct ReplyRepository {
    conn: DatabaseConnection,
}

impl ReplyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, new: NewReply) -> Result<replies::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = replies::ActiveModel {
            reply_id: NotSet,
            content: Set(new.content),
            thread_id: Set(new.thread_id),
            user_id: Set(new.user_id),
            status: Set(ReplyStatus::Active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert reply")?;

        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<replies::Model>> {
        let reply = replies::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query reply by ID")?;

        Ok(reply)
    }

    /// Replies for a thread, oldest first.
    pub async fn list_for_thread(&self, thread_id: i32) -> Result<Vec<replies::Model>> {
        let list = replies::Entity::find()
            .filter(replies::Column::ThreadId.eq(thread_id))
            .order_by_asc(replies::Column::ReplyId)
            .all(&self.conn)
            .await
            .context("Failed to list replies for thread")?;

        Ok(list)
    }

    /// Flip a reply to the deleted status instead of removing the row, so
    /// the thread keeps its shape. Returns `None` when no row matched.
    pub async fn soft_delete(&self, id: i32) -> Result<Option<replies::Model>> {
        let Some(reply) = replies::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query reply for delete")?
        else {
            return Ok(None);
        };

        let mut active: replies::ActiveModel = reply.into();
        active.status = Set(ReplyStatus::Deleted);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to mark reply deleted")?;

        Ok(Some(model))
    }

    pub async fn count(&self) -> Result<u64> {
        let count = replies::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count replies")?;

        Ok(count)
    }
}
