use async_trait::async_trait;
use tokio::sync::broadcast;

pub mod memory;
pub mod redis;

pub use memory::InMemoryTransport;
pub use redis::RedisTransport;

/// One payload received on a pub/sub channel.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

/// Narrow seam over the publish/subscribe transport. Delivery is at-most-once
/// per connected subscriber; durability lives in the conversation store, not
/// here. Tests substitute [`InMemoryTransport`] for the redis-backed one.
#[async_trait]
pub trait RealtimeTransport: Send + Sync + std::fmt::Debug {
    /// Publishes a payload to a channel.
    ///
    /// # Errors
    /// Returns an error if the transport is unavailable. Callers treat this
    /// as best-effort and must not fail persistence on it.
    async fn publish(&self, channel: &str, payload: &[u8]) -> anyhow::Result<()>;

    /// Subscribes to a channel, starting a listener if needed.
    ///
    /// # Errors
    /// Returns an error if the subscription cannot be established.
    async fn subscribe(&self, channel: &str) -> anyhow::Result<broadcast::Receiver<ChannelMessage>>;
}
