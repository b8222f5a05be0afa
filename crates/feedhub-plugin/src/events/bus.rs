//! Event bus: named events, synchronous handlers, bounded history.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use crate::extensions::renderer::panic_message;

/// Subscribing to this name receives every event.
pub const WILDCARD: &str = "*";

/// An emitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// Event name, e.g. `"post:created"`.
    pub name: String,
    /// Event payload.
    pub data: Value,
    /// Who emitted it: a plugin id or `"host"`.
    pub source: String,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl AppEvent {
    /// Creates a new event.
    pub fn new(name: impl Into<String>, data: Value, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data,
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Event handler callback.
pub type EventHandler = Arc<dyn Fn(&AppEvent) + Send + Sync>;

/// Entry in the subscription list.
#[derive(Clone)]
struct Subscription {
    /// Subscription handle.
    id: SubscriptionId,
    /// Event name, or [`WILDCARD`].
    event: String,
    /// Subscriber, a plugin id or `None` for the host.
    owner: Option<String>,
    /// The handler.
    handler: EventHandler,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Publish/subscribe bus for decoupled cross-plugin notification.
#[derive(Debug)]
pub struct EventBus {
    /// Subscriptions in subscription order.
    subscriptions: RwLock<Vec<Subscription>>,
    /// Most recent events, oldest first.
    history: RwLock<VecDeque<AppEvent>>,
    /// Maximum history length.
    history_size: usize,
    /// Next subscription id.
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates a bus keeping the last 100 events.
    pub fn new() -> Self {
        Self::with_history(100)
    }

    /// Creates a bus keeping the last `history_size` events.
    pub fn with_history(history_size: usize) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::with_capacity(history_size)),
            history_size,
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes a handler to an event name.
    pub async fn subscribe<F>(&self, event: &str, owner: Option<&str>, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.write().await.push(Subscription {
            id,
            event: event.to_string(),
            owner: owner.map(str::to_string),
            handler: Arc::new(handler),
        });

        debug!(event = %event, subscription = %id, owner = ?owner, "Event subscription added");
        id
    }

    /// Removes a subscription.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }

    /// Emits an event and returns how many handlers completed.
    ///
    /// Handlers run in subscription order, after the subscription list lock
    /// is released, so a handler may itself subscribe or emit. A panicking
    /// handler is logged against its owner and the remaining handlers still
    /// run.
    pub async fn emit(&self, name: &str, data: Value, source: &str) -> usize {
        let event = AppEvent::new(name, data, source);

        {
            let mut history = self.history.write().await;
            if self.history_size > 0 {
                if history.len() >= self.history_size {
                    history.pop_front();
                }
                history.push_back(event.clone());
            }
        }

        let handlers: Vec<(Option<String>, EventHandler)> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.event == name || s.event == WILDCARD)
            .map(|s| (s.owner.clone(), s.handler.clone()))
            .collect();

        debug!(event = %name, source = %source, handlers = handlers.len(), "Emitting event");

        let mut delivered = 0;
        for (owner, handler) in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(()) => delivered += 1,
                Err(panic) => error!(
                    event = %name,
                    owner = owner.as_deref().unwrap_or("host"),
                    "Event handler panicked: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }
        delivered
    }

    /// Recent events, oldest first.
    pub async fn history(&self) -> Vec<AppEvent> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Recent events with a given name, oldest first.
    pub async fn history_for(&self, name: &str) -> Vec<AppEvent> {
        self.history
            .read()
            .await
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Number of subscriptions for an event name, wildcard ones excluded.
    pub async fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.event == event)
            .count()
    }

    /// Total number of subscriptions.
    pub async fn total_subscriptions(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
