//! # Event Bus
//!
//! Publish/subscribe over named topics. The bus owns delivery; callers only
//! publish events and drain subscriptions. Two implementations ship:
//! [`RedisBus`](crate::events::redis_bus::RedisBus) for deployments and
//! [`LocalBus`] for single-process runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::events::error::BusError;
use crate::events::event::Event;

/// Buffer of the per-subscription delivery channel.
pub const SUBSCRIPTION_BUFFER: usize = 1024;

/// A topic-based publish/subscribe transport.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one event to `topic`.
    async fn publish(&self, topic: &str, event: &Event) -> Result<(), BusError>;

    /// Opens a subscription that receives every event published to `topic`
    /// from now on.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError>;
}

/// The receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    /// Wraps the receiving half of a delivery channel.
    pub fn new(topic: &str, rx: mpsc::Receiver<Event>) -> Self {
        Self {
            topic: topic.to_string(),
            rx,
        }
    }

    /// The subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next event. `None` once the transport has gone away.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Returns an already delivered event without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// # Local Bus
///
/// In-process bus with one `tokio::sync::broadcast` channel per topic.
/// Events published while nobody is subscribed are dropped, the same as
/// Redis pub/sub.
pub struct LocalBus {
    topics: Mutex<HashMap<String, broadcast::Sender<Event>>>,
    capacity: usize,
}

impl LocalBus {
    /// Creates a bus whose topics buffer up to `capacity` events per
    /// subscriber before the slowest one starts losing events.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Event> {
        let mut topics = self.topics.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(SUBSCRIPTION_BUFFER)
    }
}

#[async_trait]
impl EventBus for LocalBus {
    async fn publish(&self, topic: &str, event: &Event) -> Result<(), BusError> {
        if self.sender(topic).send(event.clone()).is_err() {
            log::trace!("No subscribers on '{}', event {} dropped", topic, event.id);
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let mut source = self.sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let topic_name = topic.to_string();

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Subscriber on '{}' lagged, {} events skipped", topic_name, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            log::debug!("Local subscription on '{}' closed", topic_name);
        });

        Ok(Subscription::new(topic, rx))
    }
}
