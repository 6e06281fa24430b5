use crate::domain::Message;
use crate::realtime::{ChannelMessage, RealtimeTransport};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Fans persisted messages out to the per-match realtime channel.
#[derive(Clone, Debug)]
pub struct RealtimeDispatcher {
    transport: Arc<dyn RealtimeTransport>,
}

impl RealtimeDispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self { transport }
    }

    /// Deterministic channel name for a match.
    #[must_use]
    pub fn channel_for(match_id: Uuid) -> String {
        format!("match:{match_id}")
    }

    /// Best-effort publish of an already-persisted message. A transport
    /// failure is logged and swallowed: the message stays retrievable via
    /// history, and the send that produced it has already succeeded.
    pub async fn publish_message(&self, message: &Message) {
        let channel = Self::channel_for(message.match_id);
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, message_id = %message.id, "Failed to encode realtime payload");
                return;
            }
        };

        if let Err(e) = self.transport.publish(&channel, &payload).await {
            tracing::warn!(
                error = %e,
                channel = %channel,
                message_id = %message.id,
                "Realtime publish failed; message remains available via history"
            );
        }
    }

    /// Subscribes to a match's channel.
    ///
    /// # Errors
    /// Returns an error if the transport cannot establish the subscription.
    pub async fn subscribe(&self, match_id: Uuid) -> anyhow::Result<broadcast::Receiver<ChannelMessage>> {
        self.transport.subscribe(&Self::channel_for(match_id)).await
    }
}
