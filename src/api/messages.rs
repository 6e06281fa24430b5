use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::domain::Message;
use crate::error::Result;
use crate::services::PostOutcome;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returns the full ordered history of a match.
///
/// # Errors
/// Returns `AppError::NotFound` if the match is absent or the caller is not
/// a participant.
pub async fn get_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>> {
    let history = state.conversation_service.history(match_id, auth_user.user_id).await?;
    Ok(Json(history))
}

/// Posts a message to a match. Policy rejections are surfaced verbatim in
/// the body with `success: false`.
///
/// # Errors
/// Returns `AppError::NotFound` if the match is absent or the caller is not
/// a participant.
pub async fn post_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<PostMessageResponse>> {
    let outcome = state
        .conversation_service
        .post_message(match_id, auth_user.user_id, &auth_user.name, &req.text)
        .await?;

    let response = match outcome {
        PostOutcome::Sent(message) => PostMessageResponse { success: true, message: Some(message), error: None },
        PostOutcome::Rejected { reason } => PostMessageResponse { success: false, message: None, error: Some(reason) },
    };

    Ok(Json(response))
}
