use crate::domain::{Item, MatchRecord, MatchWithItems};
use crate::error::{AppError, Result};
use crate::storage::{DbPool, MatchStore};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct MatchRepository {
    pool: DbPool,
}

impl MatchRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_item(&self, id: Uuid) -> Result<Item> {
        sqlx::query_as::<_, Item>(
            r"
            SELECT id, owner_id, owner_name, title, value, created_at
            FROM items
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn with_items(&self, record: MatchRecord) -> Result<MatchWithItems> {
        let item_a = self.load_item(record.item_a_id).await?;
        let item_b = self.load_item(record.item_b_id).await?;
        Ok(MatchWithItems { record, item_a, item_b })
    }
}

#[async_trait]
impl MatchStore for MatchRepository {
    async fn create_or_get(&self, item_x: Uuid, item_y: Uuid) -> Result<(MatchRecord, bool)> {
        let (item_a_id, item_b_id) = MatchRecord::ordered_pair(item_x, item_y);

        // Both reciprocal swipes may race here; the pair constraint lets
        // exactly one insert win and the loser re-reads the winning row.
        let inserted = sqlx::query_as::<_, MatchRecord>(
            r"
            INSERT INTO matches (id, item_a_id, item_b_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_a_id, item_b_id) DO NOTHING
            RETURNING id, item_a_id, item_b_id, created_at
            ",
        )
        .bind(Uuid::now_v7())
        .bind(item_a_id)
        .bind(item_b_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = inserted {
            return Ok((record, true));
        }

        let existing = self.find_by_pair(item_a_id, item_b_id).await?.ok_or_else(|| {
            AppError::Conflict("match insert conflicted but no winning row found".to_string())
        })?;

        Ok((existing, false))
    }

    async fn find_by_pair(&self, item_x: Uuid, item_y: Uuid) -> Result<Option<MatchRecord>> {
        let (item_a_id, item_b_id) = MatchRecord::ordered_pair(item_x, item_y);

        let record = sqlx::query_as::<_, MatchRecord>(
            r"
            SELECT id, item_a_id, item_b_id, created_at
            FROM matches
            WHERE item_a_id = $1 AND item_b_id = $2
            ",
        )
        .bind(item_a_id)
        .bind(item_b_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_with_items(&self, id: Uuid) -> Result<Option<MatchWithItems>> {
        let record = sqlx::query_as::<_, MatchRecord>(
            r"
            SELECT id, item_a_id, item_b_id, created_at
            FROM matches
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(Some(self.with_items(record).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MatchWithItems>> {
        let records = sqlx::query_as::<_, MatchRecord>(
            r"
            SELECT m.id, m.item_a_id, m.item_b_id, m.created_at
            FROM matches m
            JOIN items a ON a.id = m.item_a_id
            JOIN items b ON b.id = m.item_b_id
            WHERE a.owner_id = $1 OR b.owner_id = $1
            ORDER BY m.created_at DESC, m.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::with_capacity(records.len());
        for record in records {
            matches.push(self.with_items(record).await?);
        }

        Ok(matches)
    }
}
