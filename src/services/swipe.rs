use crate::domain::{SwipeDirection, value_parity_holds};
use crate::error::{AppError, Result};
use crate::storage::{ItemStore, MatchStore, SwipeStore};
use std::sync::Arc;
use uuid::Uuid;

/// Soft rejection of a swipe. Not an error: the caller surfaces the reason
/// as a UX message and nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeRejection {
    /// The swiper has nothing listed, so there is no item to offer.
    NoActiveItem,
    /// The declared values fall outside the parity tolerance.
    ValueMismatch,
}

impl SwipeRejection {
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::NoActiveItem => "You need an item to trade!",
            Self::ValueMismatch => "Value Mismatch! Outside 10% range.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// The event was appended to the ledger.
    Recorded { matched: bool, match_id: Option<Uuid> },
    /// The same LIKE already existed; nothing was written. `matched` reports
    /// whether the pair has a match (possibly from the earlier swipe).
    Duplicate { matched: bool, match_id: Option<Uuid> },
    Rejected(SwipeRejection),
}

impl SwipeOutcome {
    #[must_use]
    pub const fn recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }

    #[must_use]
    pub const fn matched(&self) -> bool {
        matches!(self, Self::Recorded { matched: true, .. } | Self::Duplicate { matched: true, .. })
    }

    #[must_use]
    pub const fn match_id(&self) -> Option<Uuid> {
        match self {
            Self::Recorded { match_id, .. } | Self::Duplicate { match_id, .. } => *match_id,
            Self::Rejected(_) => None,
        }
    }
}

/// Swipe ledger plus match detector. Parity is checked before the LIKE is
/// written (a doomed like is never stored); reciprocity is checked after,
/// since only the second LIKE of a pair can observe the first.
#[derive(Clone, Debug)]
pub struct SwipeService {
    items: Arc<dyn ItemStore>,
    swipes: Arc<dyn SwipeStore>,
    matches: Arc<dyn MatchStore>,
    value_tolerance: f64,
}

impl SwipeService {
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemStore>,
        swipes: Arc<dyn SwipeStore>,
        matches: Arc<dyn MatchStore>,
        value_tolerance: f64,
    ) -> Self {
        Self { items, swipes, matches, value_tolerance }
    }

    /// Records a swipe from `user_id` toward `target_item_id` and, for a
    /// LIKE, runs match detection.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the target item does not exist and
    /// `AppError::BadRequest` if the user swipes on their own item. Parity
    /// and missing-item conditions come back as `SwipeOutcome::Rejected`.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self),
        fields(user_id = %user_id, target_item_id = %target_item_id, direction = ?direction)
    )]
    pub async fn record_swipe(
        &self,
        user_id: Uuid,
        target_item_id: Uuid,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome> {
        let target = self.items.get(target_item_id).await?.ok_or(AppError::NotFound)?;
        if target.owner_id == user_id {
            return Err(AppError::BadRequest("Cannot swipe on your own item".to_string()));
        }

        let active = self.items.latest_owned_by(user_id).await?;

        if direction == SwipeDirection::Pass {
            self.swipes.record_pass(user_id, active.map(|i| i.id), target_item_id).await?;
            return Ok(SwipeOutcome::Recorded { matched: false, match_id: None });
        }

        let Some(active) = active else {
            return Ok(SwipeOutcome::Rejected(SwipeRejection::NoActiveItem));
        };

        if !value_parity_holds(active.value, target.value, self.value_tolerance) {
            tracing::debug!(
                offered = active.value,
                wanted = target.value,
                "Swipe rejected: values outside tolerance"
            );
            return Ok(SwipeOutcome::Rejected(SwipeRejection::ValueMismatch));
        }

        if !self.swipes.record_like(user_id, active.id, target.id).await? {
            let existing = self.matches.find_by_pair(active.id, target.id).await?;
            return Ok(SwipeOutcome::Duplicate {
                matched: existing.is_some(),
                match_id: existing.map(|m| m.id),
            });
        }

        // Reciprocal direction: their item liking ours.
        if self.swipes.like_exists(target.id, active.id).await? {
            let (record, created) = self.matches.create_or_get(active.id, target.id).await?;
            if created {
                tracing::info!(match_id = %record.id, "Match created");
            } else {
                // Lost the creation race to the reciprocal swipe; report the
                // winning match instead of erroring.
                tracing::debug!(match_id = %record.id, "Match already existed");
            }
            return Ok(SwipeOutcome::Recorded { matched: true, match_id: Some(record.id) });
        }

        Ok(SwipeOutcome::Recorded { matched: false, match_id: None })
    }
}
