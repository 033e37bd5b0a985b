use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::collections::HashMap;

use crate::entities::threads::ThreadStatus;
use crate::entities::{replies, threads};

#[derive(Debug, Clone)]
pub struct NewThread {
    pub title: String,
    pub content: String,
    pub user_id: i32,
}

/// Partial update applied to a thread row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ThreadPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ThreadStatus>,
}

impl ThreadPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.status.is_none()
    }
}

pub struct ThreadRepository {
    conn: DatabaseConnection,
}

impl ThreadRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, new: NewThread) -> Result<threads::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = threads::ActiveModel {
            thread_id: NotSet,
            title: Set(new.title),
            content: Set(new.content),
            user_id: Set(new.user_id),
            status: Set(ThreadStatus::Open),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert thread")?;

        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<threads::Model>> {
        let thread = threads::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query thread by ID")?;

        Ok(thread)
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        let thread = threads::Entity::find_by_id(id)
            .select_only()
            .column(threads::Column::ThreadId)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await
            .context("Failed to check thread existence")?;

        Ok(thread.is_some())
    }

    /// List threads, newest first.
    pub async fn list(&self) -> Result<Vec<threads::Model>> {
        let list = threads::Entity::find()
            .order_by_desc(threads::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list threads")?;

        Ok(list)
    }

    /// Reply counts per thread for a set of thread IDs, one grouped query.
    pub async fn reply_counts(&self, thread_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        if thread_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = replies::Entity::find()
            .select_only()
            .column(replies::Column::ThreadId)
            .column_as(replies::Column::ReplyId.count(), "reply_count")
            .filter(replies::Column::ThreadId.is_in(thread_ids.to_vec()))
            .group_by(replies::Column::ThreadId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count replies per thread")?;

        Ok(rows.into_iter().collect())
    }

    /// Apply a partial update. Returns `None` when no row matched.
    pub async fn update(&self, id: i32, patch: ThreadPatch) -> Result<Option<threads::Model>> {
        let Some(thread) = threads::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query thread for update")?
        else {
            return Ok(None);
        };

        let mut active: threads::ActiveModel = thread.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }

        if let Some(content) = patch.content {
            active.content = Set(content);
        }

        if let Some(status) = patch.status {
            active.status = Set(status);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update thread")?;

        Ok(Some(model))
    }

    /// Delete a thread and its replies in one transaction. Returns `true`
    /// when a thread row was actually removed.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool> {
        let result = self
            .conn
            .transaction::<_, u64, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    replies::Entity::delete_many()
                        .filter(replies::Column::ThreadId.eq(id))
                        .exec(txn)
                        .await?;

                    let deleted = threads::Entity::delete_by_id(id).exec(txn).await?;

                    Ok(deleted.rows_affected)
                })
            })
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(TransactionError::Connection(e) | TransactionError::Transaction(e)) => {
                Err(e.into())
            }
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count = threads::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count threads")?;

        Ok(count)
    }
}
