use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A listed item. Created by the external upload flow; immutable for
/// matching purposes once referenced by swipes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub title: String,
    pub value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The value-parity rule: a trade is admissible iff the declared values
/// differ by no more than `tolerance` of the smaller value.
#[must_use]
pub fn value_parity_holds(v1: f64, v2: f64, tolerance: f64) -> bool {
    (v1 - v2).abs() <= tolerance * v1.min(v2)
}
