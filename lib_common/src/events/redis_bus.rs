//! # Redis Event Bus
//!
//! Event bus on Redis pub/sub: one channel per topic, envelopes encoded with
//! [`Event::to_wire`]. Publishing goes through a shared `ConnectionManager`
//! that reconnects on its own; every subscription holds a dedicated pub/sub
//! connection drained by a background task.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::mpsc;

use crate::events::bus::{EventBus, SUBSCRIPTION_BUFFER, Subscription};
use crate::events::error::BusError;
use crate::events::event::Event;

/// Redis-backed [`EventBus`].
#[derive(Clone)]
pub struct RedisBus {
    client: redis::Client,
    publisher: ConnectionManager,
}

impl RedisBus {
    /// Connects to Redis at `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let publisher = ConnectionManager::new(client.clone()).await?;
        log::info!("Connected event bus to Redis");
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl EventBus for RedisBus {
    async fn publish(&self, topic: &str, event: &Event) -> Result<(), BusError> {
        let payload = event.to_wire()?;
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn.publish(topic, payload).await?;
        log::trace!("Published {} to '{}' ({} receivers)", event.id, topic, receivers);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let topic_name = topic.to_string();

        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let payload: Vec<u8> = match msg.get_payload() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("Unreadable payload on '{}': {}", topic_name, e);
                        continue;
                    }
                };
                match Event::from_wire(&payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("Skipping undecodable event on '{}': {}", topic_name, e),
                }
            }
            log::info!("Redis subscription on '{}' closed", topic_name);
        });

        Ok(Subscription::new(topic, rx))
    }
}
