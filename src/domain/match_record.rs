use crate::domain::Item;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A mutually agreed item pairing. The pair is stored ordered
/// (`item_a_id < item_b_id`) so one uniqueness constraint covers both
/// swipe directions. Permanent once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRecord {
    pub id: Uuid,
    pub item_a_id: Uuid,
    pub item_b_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MatchRecord {
    /// Normalizes an item pair into storage order.
    #[must_use]
    pub fn ordered_pair(x: Uuid, y: Uuid) -> (Uuid, Uuid) {
        if x < y { (x, y) } else { (y, x) }
    }
}

/// A match joined with both items, enough to resolve participants.
#[derive(Debug, Clone)]
pub struct MatchWithItems {
    pub record: MatchRecord,
    pub item_a: Item,
    pub item_b: Item,
}

impl MatchWithItems {
    #[must_use]
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.item_a.owner_id == user_id || self.item_b.owner_id == user_id
    }

    /// Splits the pair into (mine, theirs) from `user_id`'s perspective.
    #[must_use]
    pub fn sides_for(&self, user_id: Uuid) -> (&Item, &Item) {
        if self.item_a.owner_id == user_id {
            (&self.item_a, &self.item_b)
        } else {
            (&self.item_b, &self.item_a)
        }
    }
}

/// One row of the match list shown to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub my_item: Item,
    pub their_item: Item,
    pub counterpart_id: Uuid,
    pub counterpart_name: String,
    pub last_message_preview: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
