use crate::domain::Message;
use crate::error::Result;
use crate::storage::{DbPool, MessageStore};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(&self, match_id: Uuid, sender_id: Uuid, sender_name: &str, content: &str) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r"
            INSERT INTO messages (id, match_id, sender_id, sender_name, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, match_id, sender_id, sender_name, content, created_at
            ",
        )
        .bind(Uuid::now_v7())
        .bind(match_id)
        .bind(sender_id)
        .bind(sender_name)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn history(&self, match_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r"
            SELECT id, match_id, sender_id, sender_name, content, created_at
            FROM messages
            WHERE match_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn latest(&self, match_id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r"
            SELECT id, match_id, sender_id, sender_name, content, created_at
            FROM messages
            WHERE match_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }
}
