use crate::domain::Item;
use crate::error::Result;
use crate::storage::{DbPool, ItemStore, NewItem};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ItemRepository {
    pool: DbPool,
}

impl ItemRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn insert(&self, item: NewItem) -> Result<Item> {
        let row = sqlx::query_as::<_, Item>(
            r"
            INSERT INTO items (id, owner_id, owner_name, title, value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, owner_name, title, value, created_at
            ",
        )
        .bind(Uuid::now_v7())
        .bind(item.owner_id)
        .bind(&item.owner_name)
        .bind(&item.title)
        .bind(item.value)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r"
            SELECT id, owner_id, owner_name, title, value, created_at
            FROM items
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn latest_owned_by(&self, user_id: Uuid) -> Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r"
            SELECT id, owner_id, owner_name, title, value, created_at
            FROM items
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}
