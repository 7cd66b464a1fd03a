use crate::messaging::event::{EventMessage, EventType};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default number of events buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 256;

/// Callback function type for event handling
pub type EventCallback = Arc<dyn Fn(EventMessage) -> Result<()> + Send + Sync>;

/// Message broker service trait
#[async_trait]
pub trait MessageBrokerTrait: Send + Sync {
    /// Publish an event
    async fn publish<T: Serialize + Send>(&self, event_type: EventType, source_id: Option<Uuid>, payload: T) -> Result<()>;

    /// Subscribe to an event type
    async fn subscribe(&self, event_type: EventType, callback: EventCallback) -> Result<String>;

    /// Subscribe to a routing pattern (`*` matches one word, `#` any number)
    async fn subscribe_pattern(&self, pattern: &str, callback: EventCallback) -> Result<String>;

    /// Unsubscribe from a subscription
    async fn unsubscribe(&self, subscription_id: &str) -> Result<()>;
}

/// Topic-style match of a dotted routing key
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    fn matches(pattern: &[&str], key: &[&str]) -> bool {
        match (pattern.first(), key.first()) {
            (None, None) => true,
            (Some(&"#"), _) => {
                matches(&pattern[1..], key) || (!key.is_empty() && matches(pattern, &key[1..]))
            }
            (Some(&"*"), Some(_)) => matches(&pattern[1..], &key[1..]),
            (Some(p), Some(k)) if p == k => matches(&pattern[1..], &key[1..]),
            _ => false,
        }
    }

    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches(&pattern, &key)
}

/// In-process broadcast broker; every subscription is a consumer task
pub struct MessageBroker {
    /// Broadcast sender shared by every subscription
    sender: broadcast::Sender<EventMessage>,
    /// Subscriptions map
    subscriptions: Arc<RwLock<HashMap<String, JoinHandle<()>>>>,
}

impl MessageBroker {
    /// Create a new message broker
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish an already-built message
    pub fn publish_message(&self, message: EventMessage) {
        let routing_key = message.routing_key();
        match self.sender.send(message) {
            Ok(receivers) => debug!("Published {} to {} receivers", routing_key, receivers),
            Err(_) => debug!("Published {} with no receivers", routing_key),
        }
    }

    /// Start a consumer task delivering matching events to the callback
    async fn start_consumer<F>(&self, label: String, filter: F, callback: EventCallback) -> Result<String>
    where
        F: Fn(&EventMessage) -> bool + Send + Sync + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let subscription_id = Uuid::new_v4().to_string();
        let task_label = label.clone();

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if !filter(&message) {
                            continue;
                        }
                        if let Err(e) = callback(message) {
                            error!("Event callback for {} failed: {}", task_label, e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber {} lagged, skipped {} events", task_label, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        self.subscriptions
            .write()
            .await
            .insert(subscription_id.clone(), handle);

        info!("Subscribed {} to {}", subscription_id, label);
        Ok(subscription_id)
    }
}

#[async_trait]
impl MessageBrokerTrait for MessageBroker {
    async fn publish<T: Serialize + Send>(&self, event_type: EventType, source_id: Option<Uuid>, payload: T) -> Result<()> {
        let message = EventMessage::new(event_type, source_id, payload)?;
        self.publish_message(message);
        Ok(())
    }

    async fn subscribe(&self, event_type: EventType, callback: EventCallback) -> Result<String> {
        let label = event_type.to_string();
        self.start_consumer(label, move |message| message.event_type == event_type, callback)
            .await
    }

    async fn subscribe_pattern(&self, pattern: &str, callback: EventCallback) -> Result<String> {
        let owned = pattern.to_string();
        self.start_consumer(
            pattern.to_string(),
            move |message| topic_matches(&owned, &message.routing_key()),
            callback,
        )
        .await
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        match self.subscriptions.write().await.remove(subscription_id) {
            Some(handle) => {
                handle.abort();
                info!("Unsubscribed {}", subscription_id);
                Ok(())
            }
            None => Err(anyhow::anyhow!("Unknown subscription: {}", subscription_id)),
        }
    }
}

impl Drop for MessageBroker {
    fn drop(&mut self) {
        if let Ok(mut subscriptions) = self.subscriptions.try_write() {
            for (_, handle) in subscriptions.drain() {
                handle.abort();
            }
        }
    }
}

/// Create the shared broker
pub fn create_message_broker(capacity: usize) -> Arc<MessageBroker> {
    Arc::new(MessageBroker::new(capacity))
}
