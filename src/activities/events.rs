// activities/events.rs
// Internal event bus for activity changes.
//
// Subscribers register through `subscribe()` and receive every event on
// their own unbounded queue. Dropping the returned `Subscription`
// unregisters it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::logger::{self, LogTag};

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// Empty `updated_ids` and `replaced_ids` mean a bulk reload
    ActivitiesChanged {
        account_id: String,
        updated_ids: Vec<String>,
        replaced_ids: HashMap<String, String>,
    },
    /// A fresh confirmed incoming transfer that should play the alert sound
    IncomingTransaction {
        account_id: String,
        activity_id: String,
    },
    /// Display settings (hide tiny transfers, allow-lists) changed
    SettingsChanged,
}

impl ActivityEvent {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            ActivityEvent::ActivitiesChanged { account_id, .. } => Some(account_id),
            ActivityEvent::IncomingTransaction { account_id, .. } => Some(account_id),
            ActivityEvent::SettingsChanged => None,
        }
    }
}

struct SubscriberEntry {
    sender: mpsc::UnboundedSender<ActivityEvent>,
    queued: Arc<AtomicUsize>,
}

type Registry = RwLock<HashMap<u64, SubscriberEntry>>;

pub struct ActivityEventBus {
    next_id: AtomicU64,
    subscribers: Arc<Registry>,
    warn_threshold: usize,
}

impl ActivityEventBus {
    pub fn new(warn_threshold: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            warn_threshold,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));

        self.subscribers.write().insert(
            id,
            SubscriberEntry {
                sender,
                queued: queued.clone(),
            },
        );

        Subscription {
            id,
            receiver,
            queued,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn publish(&self, event: ActivityEvent) {
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, entry) in subscribers.iter() {
                if entry.sender.send(event.clone()).is_err() {
                    closed.push(*id);
                    continue;
                }
                let queued = entry.queued.fetch_add(1, Ordering::Relaxed) + 1;
                if queued == self.warn_threshold {
                    logger::warning(
                        LogTag::Store,
                        &format!("Subscriber {} has {} unprocessed activity events", id, queued),
                    );
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in closed {
                subscribers.remove(&id);
            }
        }
    }
}

/// Registration handle; unsubscribes on drop
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<ActivityEvent>,
    queued: Arc<AtomicUsize>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// None once the bus is gone
    pub async fn recv(&mut self) -> Option<ActivityEvent> {
        let event = self.receiver.recv().await;
        if event.is_some() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
        event
    }

    pub fn try_recv(&mut self) -> Option<ActivityEvent> {
        let event = self.receiver.try_recv().ok();
        if event.is_some() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
        event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(account_id: &str) -> ActivityEvent {
        ActivityEvent::ActivitiesChanged {
            account_id: account_id.to_string(),
            updated_ids: vec![],
            replaced_ids: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_events() {
        let bus = ActivityEventBus::new(1024);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(changed("acc-1"));

        assert_eq!(first.recv().await, Some(changed("acc-1")));
        assert_eq!(second.recv().await, Some(changed("acc-1")));
        assert!(first.try_recv().is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = ActivityEventBus::new(1024);
        let subscription = bus.subscribe();
        let _other = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(subscription);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(ActivityEvent::SettingsChanged);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = ActivityEventBus::new(1024);
        let mut subscription = bus.subscribe();
        bus.publish(ActivityEvent::SettingsChanged);
        drop(bus);

        assert_eq!(subscription.try_recv(), Some(ActivityEvent::SettingsChanged));
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_event_account_id() {
        assert_eq!(changed("acc-9").account_id(), Some("acc-9"));
        assert_eq!(ActivityEvent::SettingsChanged.account_id(), None);
    }
}
