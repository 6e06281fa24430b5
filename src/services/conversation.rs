use crate::domain::{MatchSummary, MatchWithItems, Message};
use crate::error::{AppError, Result};
use crate::realtime::ChannelMessage;
use crate::services::dispatcher::RealtimeDispatcher;
use crate::services::policy::ContentPolicy;
use crate::storage::{MatchStore, MessageStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Preview text for a conversation with no messages yet.
const NEW_MATCH_PREVIEW: &str = "New Match!";

#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// Persisted and handed to the dispatcher.
    Sent(Message),
    /// Rejected by validation or content policy; nothing persisted.
    Rejected { reason: String },
}

/// Conversation store operations: participant-checked history, match
/// listing, and message posting with policy screening and realtime fan-out.
#[derive(Clone, Debug)]
pub struct ConversationService {
    matches: Arc<dyn MatchStore>,
    messages: Arc<dyn MessageStore>,
    policy: Arc<dyn ContentPolicy>,
    dispatcher: RealtimeDispatcher,
}

impl ConversationService {
    #[must_use]
    pub fn new(
        matches: Arc<dyn MatchStore>,
        messages: Arc<dyn MessageStore>,
        policy: Arc<dyn ContentPolicy>,
        dispatcher: RealtimeDispatcher,
    ) -> Self {
        Self { matches, messages, policy, dispatcher }
    }

    /// Loads a match and verifies `user_id` owns one of its items. A match
    /// the user is not part of is indistinguishable from a missing one.
    async fn require_participant(&self, match_id: Uuid, user_id: Uuid) -> Result<MatchWithItems> {
        let joined = self.matches.get_with_items(match_id).await?.ok_or(AppError::NotFound)?;
        if !joined.involves(user_id) {
            return Err(AppError::NotFound);
        }
        Ok(joined)
    }

    /// Validates, persists, and fans out a message. Publishing happens only
    /// after the row is durable and never fails the send.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the match does not exist or the
    /// sender is not a participant. Policy violations come back as
    /// `PostOutcome::Rejected`.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, text, sender_name),
        fields(match_id = %match_id, sender_id = %sender_id)
    )]
    pub async fn post_message(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        text: &str,
    ) -> Result<PostOutcome> {
        self.require_participant(match_id, sender_id).await?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(PostOutcome::Rejected { reason: "Message cannot be empty".to_string() });
        }

        if let Some(reason) = self.policy.violation(text) {
            tracing::info!("Message blocked by content policy");
            return Ok(PostOutcome::Rejected { reason });
        }

        let message = self.messages.append(match_id, sender_id, sender_name, text).await?;
        self.dispatcher.publish_message(&message).await;

        Ok(PostOutcome::Sent(message))
    }

    /// Full ordered history of a match.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the match is absent or the caller is
    /// not a participant.
    pub async fn history(&self, match_id: Uuid, user_id: Uuid) -> Result<Vec<Message>> {
        self.require_participant(match_id, user_id).await?;
        self.messages.history(match_id).await
    }

    /// The caller's matches, newest first, each with the counterpart item,
    /// owner identity, and a last-message preview.
    ///
    /// # Errors
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_matches(&self, user_id: Uuid) -> Result<Vec<MatchSummary>> {
        let joined = self.matches.list_for_user(user_id).await?;

        let mut summaries = Vec::with_capacity(joined.len());
        for m in joined {
            let preview = self
                .messages
                .latest(m.record.id)
                .await?
                .map_or_else(|| NEW_MATCH_PREVIEW.to_string(), |msg| msg.content);

            let (mine, theirs) = m.sides_for(user_id);
            summaries.push(MatchSummary {
                match_id: m.record.id,
                my_item: mine.clone(),
                their_item: theirs.clone(),
                counterpart_id: theirs.owner_id,
                counterpart_name: theirs.owner_name.clone(),
                last_message_preview: preview,
                created_at: m.record.created_at,
            });
        }

        Ok(summaries)
    }

    /// Subscribes a participant to a match's realtime channel.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` for non-participants and
    /// `AppError::Internal` if the transport cannot subscribe.
    pub async fn subscribe(&self, match_id: Uuid, user_id: Uuid) -> Result<broadcast::Receiver<ChannelMessage>> {
        self.require_participant(match_id, user_id).await?;
        self.dispatcher.subscribe(match_id).await.map_err(|e| {
            tracing::error!(error = %e, match_id = %match_id, "Realtime subscribe failed");
            AppError::Internal
        })
    }
}
