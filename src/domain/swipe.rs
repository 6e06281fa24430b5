use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Pass,
}

impl SwipeDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Pass => "pass",
        }
    }
}

/// One append-only preference event: the swiper's active item toward a
/// target item. `source_item_id` is null only for PASS events from a user
/// with nothing listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_item_id: Option<Uuid>,
    pub target_item_id: Uuid,
    pub direction: SwipeDirection,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
