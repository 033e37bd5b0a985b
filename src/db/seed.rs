//! Canonical demo data, mirroring the forum's original seed set.

use anyhow::Result;
use tracing::info;

use super::{NewReply, NewThread, NewUser, Store};
use crate::config::SecurityConfig;
use crate::entities::users::Role;

/// Password assigned to every seeded account.
const SEED_PASSWORD: &str = "password";

impl Store {
    /// Insert the demo data set: three users (admin, moderator, member),
    /// two threads, and two replies on the first thread. Skipped when the
    /// users table is non-empty. Returns whether anything was inserted.
    pub async fn seed_demo_data(&self, security: &SecurityConfig) -> Result<bool> {
        if self.count_users().await? > 0 {
            info!("Database already seeded, skipping");
            return Ok(false);
        }

        let admin = self
            .create_user(seed_user("admin", Role::Admin), security)
            .await?;
        let moderator = self
            .create_user(seed_user("moderator", Role::Moderator), security)
            .await?;
        let member = self
            .create_user(seed_user("member", Role::Member), security)
            .await?;

        let first = self
            .create_thread(NewThread {
                title: "First Thread".to_string(),
                content: "This is the first thread".to_string(),
                user_id: admin.user_id,
            })
            .await?;

        self.create_thread(NewThread {
            title: "Second Thread".to_string(),
            content: "This is the second thread".to_string(),
            user_id: moderator.user_id,
        })
        .await?;

        self.create_reply(NewReply {
            thread_id: first.thread_id,
            user_id: member.user_id,
            content: "This is a reply to the first thread".to_string(),
        })
        .await?;

        self.create_reply(NewReply {
            thread_id: first.thread_id,
            user_id: moderator.user_id,
            content: "This is another reply to the first thread".to_string(),
        })
        .await?;

        info!("Seeded demo data: 3 users, 2 threads, 2 replies");

        Ok(true)
    }
}

fn seed_user(username: &str, role: Role) -> NewUser {
    NewUser {
        user_id: None,
        username: username.to_string(),
        password: SEED_PASSWORD.to_string(),
        role,
    }
}
