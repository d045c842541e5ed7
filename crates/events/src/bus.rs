//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries every dispatched [`UserEvent`] to any number of
//! external subscribers (analytics taps, audit sinks, real-time UI
//! badges). Publishing is fire-and-forget: no delivery guarantee, no
//! ordering relative to handler completion, and slow subscribers lag
//! rather than applying backpressure. Subscribers filter by
//! [`UserEvent::channel_name`] when they only care about one event type.

use tokio::sync::broadcast;

use crate::event::UserEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus, shared via `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<UserEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the durable queue, not the bus, is the delivery mechanism.
    pub fn publish(&self, event: UserEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amoria_core::EventType;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            UserEvent::new(EventType::FavoriteAdded, "bob")
                .with_target("alice")
                .with_metadata(serde_json::json!({"source": "profile"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EventType::FavoriteAdded);
        assert_eq!(received.actor, "bob");
        assert_eq!(received.target.as_deref(), Some("alice"));
        assert_eq!(received.metadata["source"], "profile");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(UserEvent::new(EventType::MessageSent, "bob"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, EventType::MessageSent);
        assert_eq!(e2.event_type, EventType::MessageSent);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(UserEvent::new(EventType::ProfileViewed, "bob"));
    }
}
