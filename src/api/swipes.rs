use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::domain::SwipeDirection;
use crate::error::Result;
use crate::services::SwipeOutcome;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub target_item_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub recorded: bool,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Records a swipe and reports whether it completed a match. Parity and
/// missing-item rejections are soft: a 200 with a reason, not an error.
///
/// # Errors
/// Returns `AppError::NotFound` if the target item does not exist.
pub async fn record_swipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SwipeRequest>,
) -> Result<Json<SwipeResponse>> {
    let outcome = state.swipe_service.record_swipe(auth_user.user_id, req.target_item_id, req.direction).await?;

    let response = match outcome {
        SwipeOutcome::Recorded { matched, match_id } => {
            SwipeResponse { recorded: true, matched, match_id, reason: None }
        }
        SwipeOutcome::Duplicate { matched, match_id } => {
            SwipeResponse { recorded: false, matched, match_id, reason: None }
        }
        SwipeOutcome::Rejected(rejection) => SwipeResponse {
            recorded: false,
            matched: false,
            match_id: None,
            reason: Some(rejection.reason().to_string()),
        },
    };

    Ok(Json(response))
}
