use crate::config::PubsubConfig;
use crate::realtime::{ChannelMessage, RealtimeTransport};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::Instrument;

/// Redis pub/sub transport. One background listener task per subscribed
/// channel fans messages out through a broadcast sender; the listener
/// reconnects with exponential backoff if the pub/sub connection drops.
#[derive(Debug)]
pub struct RedisTransport {
    publisher: redis::aio::ConnectionManager,
    subscriptions: Arc<DashMap<String, broadcast::Sender<ChannelMessage>>>,
    client: redis::Client,
    shutdown: watch::Receiver<bool>,
    channel_capacity: usize,
}

impl RedisTransport {
    /// Creates a new transport connected to the configured redis instance.
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn new(config: &PubsubConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<Arc<Self>> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let publisher = client.get_connection_manager().await?;
        let subscriptions = Arc::new(DashMap::new());

        Ok(Arc::new(Self {
            publisher,
            subscriptions,
            client,
            shutdown,
            channel_capacity: config.channel_capacity,
        }))
    }

    async fn run_channel_listener(
        client: redis::Client,
        channel: String,
        tx: broadcast::Sender<ChannelMessage>,
        mut shutdown: watch::Receiver<bool>,
        subscriptions: Arc<DashMap<String, broadcast::Sender<ChannelMessage>>>,
        ready_tx: tokio::sync::oneshot::Sender<()>,
    ) {
        let mut backoff = std::time::Duration::from_secs(1);
        let max_backoff = std::time::Duration::from_secs(30);
        let mut ready_tx = Some(ready_tx);

        loop {
            let mut pubsub = match client.get_async_pubsub().await {
                Ok(ps) => ps,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to get async pubsub, retrying in {:?}", backoff);
                    tokio::select! {
                        () = tokio::time::sleep(backoff) => {
                            backoff = std::cmp::min(backoff * 2, max_backoff);
                            continue;
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            };

            if let Err(e) = pubsub.subscribe(&channel).await {
                tracing::error!(error = %e, "Failed to subscribe to {}, retrying in {:?}", channel, backoff);
                tokio::select! {
                    () = tokio::time::sleep(backoff) => {
                        backoff = std::cmp::min(backoff * 2, max_backoff);
                        continue;
                    }
                    _ = shutdown.changed() => break,
                }
            }

            tracing::info!(channel = %channel, "Subscribed to channel");
            if let Some(rtx) = ready_tx.take() {
                let _ = rtx.send(());
            }
            backoff = std::time::Duration::from_secs(1);

            let mut message_stream = pubsub.into_on_message();

            loop {
                tokio::select! {
                    _ = shutdown.changed() => return,
                    msg = message_stream.next() => {
                        if let Some(msg) = msg {
                            let channel_msg = ChannelMessage {
                                channel: msg.get_channel_name().to_string(),
                                payload: msg.get_payload().unwrap_or_default(),
                            };
                            // A send error only means no receiver is currently
                            // attached; the listener keeps running until shutdown.
                            let _ = tx.send(channel_msg);
                        } else {
                            tracing::warn!(channel = %channel, "Pubsub connection lost, reconnecting...");
                            break;
                        }
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }
        }

        subscriptions.remove(&channel);
    }
}

#[async_trait]
impl RealtimeTransport for RedisTransport {
    async fn publish(&self, channel: &str, payload: &[u8]) -> anyhow::Result<()> {
        let mut conn = self.publisher.clone();
        conn.publish::<_, _, i64>(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> anyhow::Result<broadcast::Receiver<ChannelMessage>> {
        if let Some(tx) = self.subscriptions.get(channel) {
            return Ok(tx.subscribe());
        }

        let (tx, rx) = broadcast::channel(self.channel_capacity);
        self.subscriptions.insert(channel.to_string(), tx.clone());

        let channel_str = channel.to_string();
        let client = self.client.clone();
        let shutdown = self.shutdown.clone();
        let subscriptions = Arc::clone(&self.subscriptions);

        // Used to wait for the first successful SUBSCRIBE before returning,
        // so no publish slips past an apparently-live subscription.
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(
            async move {
                Self::run_channel_listener(client, channel_str, tx, shutdown, subscriptions, ready_tx).await;
            }
            .instrument(tracing::info_span!("redis_channel_listener", channel = %channel)),
        );

        let _ = ready_rx.await;

        Ok(rx)
    }
}
