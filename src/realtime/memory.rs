use crate::realtime::{ChannelMessage, RealtimeTransport};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// In-process transport over broadcast channels, used by the test suites in
/// place of a live redis instance.
#[derive(Debug)]
pub struct InMemoryTransport {
    channels: DashMap<String, broadcast::Sender<ChannelMessage>>,
    capacity: usize,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self { channels: DashMap::new(), capacity })
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<ChannelMessage> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

#[async_trait]
impl RealtimeTransport for InMemoryTransport {
    async fn publish(&self, channel: &str, payload: &[u8]) -> anyhow::Result<()> {
        let msg = ChannelMessage { channel: channel.to_string(), payload: payload.to_vec() };
        // A send error only means nobody is subscribed right now.
        let _ = self.sender(channel).send(msg);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> anyhow::Result<broadcast::Receiver<ChannelMessage>> {
        Ok(self.sender(channel).subscribe())
    }
}
