use crate::domain::{Item, MatchRecord, MatchWithItems, Message};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub mod item_repo;
pub mod match_repo;
pub mod memory;
pub mod message_repo;
pub mod swipe_repo;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(database_url: &str) -> std::result::Result<DbPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(20).connect(database_url).await
}

/// Fields of an item not assigned by the store.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub owner_id: Uuid,
    pub owner_name: String,
    pub title: String,
    pub value: f64,
}

#[async_trait]
pub trait ItemStore: Send + Sync + fmt::Debug {
    /// Inserts an item with a store-assigned id and timestamp. Item creation
    /// belongs to the external upload flow; this entry point exists for
    /// seeding and tests.
    async fn insert(&self, item: NewItem) -> Result<Item>;

    async fn get(&self, id: Uuid) -> Result<Option<Item>>;

    /// The user's active item: the most recently created item they own.
    async fn latest_owned_by(&self, user_id: Uuid) -> Result<Option<Item>>;
}

#[async_trait]
pub trait SwipeStore: Send + Sync + fmt::Debug {
    /// Appends a LIKE event. Returns `false` without writing when the
    /// (source, target) pair was already liked.
    async fn record_like(&self, user_id: Uuid, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool>;

    /// Appends a PASS event. The source item is absent when the swiper has
    /// nothing listed.
    async fn record_pass(&self, user_id: Uuid, source_item_id: Option<Uuid>, target_item_id: Uuid) -> Result<()>;

    /// Whether a LIKE from `source_item_id` toward `target_item_id` exists.
    async fn like_exists(&self, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait MatchStore: Send + Sync + fmt::Debug {
    /// Creates the match for an item pair, or returns the existing one when
    /// a concurrent reciprocal swipe won the race. The boolean reports
    /// whether this call created the row.
    async fn create_or_get(&self, item_x: Uuid, item_y: Uuid) -> Result<(MatchRecord, bool)>;

    async fn find_by_pair(&self, item_x: Uuid, item_y: Uuid) -> Result<Option<MatchRecord>>;

    async fn get_with_items(&self, id: Uuid) -> Result<Option<MatchWithItems>>;

    /// All matches involving an item owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MatchWithItems>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync + fmt::Debug {
    /// Appends a message with a store-assigned id and timestamp and returns
    /// the persisted row.
    async fn append(&self, match_id: Uuid, sender_id: Uuid, sender_name: &str, content: &str) -> Result<Message>;

    /// Full history for a match, ordered by `(created_at, id)` ascending.
    async fn history(&self, match_id: Uuid) -> Result<Vec<Message>>;

    /// The newest message of a match, if any.
    async fn latest(&self, match_id: Uuid) -> Result<Option<Message>>;
}

/// The four aggregate stores bundled for wiring.
#[derive(Clone, Debug)]
pub struct Stores {
    pub items: Arc<dyn ItemStore>,
    pub swipes: Arc<dyn SwipeStore>,
    pub matches: Arc<dyn MatchStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    #[must_use]
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            items: Arc::new(item_repo::ItemRepository::new(pool.clone())),
            swipes: Arc::new(swipe_repo::SwipeRepository::new(pool.clone())),
            matches: Arc::new(match_repo::MatchRepository::new(pool.clone())),
            messages: Arc::new(message_repo::MessageRepository::new(pool)),
        }
    }

    /// A store backed by process memory with the same uniqueness semantics
    /// as the Postgres schema. Used by the test suites.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            items: Arc::clone(&store) as Arc<dyn ItemStore>,
            swipes: Arc::clone(&store) as Arc<dyn SwipeStore>,
            matches: Arc::clone(&store) as Arc<dyn MatchStore>,
            messages: store as Arc<dyn MessageStore>,
        }
    }
}
