use crate::domain::SwipeDirection;
use crate::error::Result;
use crate::storage::{DbPool, SwipeStore};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SwipeRepository {
    pool: DbPool,
}

impl SwipeRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwipeStore for SwipeRepository {
    async fn record_like(&self, user_id: Uuid, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool> {
        // The partial unique index makes a duplicate LIKE a no-op rather
        // than an error.
        let result = sqlx::query(
            r"
            INSERT INTO swipe_events (id, user_id, source_item_id, target_item_id, direction)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_item_id, target_item_id) WHERE direction = 'like' DO NOTHING
            ",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(source_item_id)
        .bind(target_item_id)
        .bind(SwipeDirection::Like.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_pass(&self, user_id: Uuid, source_item_id: Option<Uuid>, target_item_id: Uuid) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO swipe_events (id, user_id, source_item_id, target_item_id, direction)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(source_item_id)
        .bind(target_item_id)
        .bind(SwipeDirection::Pass.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn like_exists(&self, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM swipe_events
                WHERE source_item_id = $1 AND target_item_id = $2 AND direction = 'like'
            )
            ",
        )
        .bind(source_item_id)
        .bind(target_item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
