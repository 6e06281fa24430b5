use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::domain::MatchSummary;
use crate::error::Result;
use axum::{Json, extract::State};

/// Lists the caller's matches, newest first.
///
/// # Errors
/// Returns `AppError::Database` if a query fails.
pub async fn list_matches(auth_user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<MatchSummary>>> {
    let summaries = state.conversation_service.list_matches(auth_user.user_id).await?;
    Ok(Json(summaries))
}
