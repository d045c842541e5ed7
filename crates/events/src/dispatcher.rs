//! Event dispatcher: concurrent, error-isolated handler execution.
//!
//! The registry is built once at startup and is immutable afterwards;
//! tests construct their own isolated registries. On dispatch, every
//! handler registered for the event type runs as its own task inside an
//! error boundary: a returned error, a panic, or a timeout in handler
//! *i* is logged and does not cancel or affect handler *j*, and nothing
//! propagates to the caller.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use amoria_core::EventType;
use futures::future::join_all;

use crate::bus::EventBus;
use crate::event::UserEvent;
use crate::resolver::NotifyError;

/// Upper bound on a single handler invocation. A handler that exceeds it
/// is treated like any other handler failure.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on follow-up event chaining (e.g. favorite_added ->
/// mutual_interest). Prevents a miswired handler from dispatching forever.
const MAX_DISPATCH_DEPTH: usize = 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error raised inside an event handler. Always isolated by the
/// dispatcher; never surfaced to the dispatching caller.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The event is missing a field this handler requires.
    #[error("Event {event_type} is missing a target user")]
    MissingTarget { event_type: EventType },

    /// Preference resolution or enqueueing failed.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// A storage operation outside the notifier failed.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Handler trait & registry
// ---------------------------------------------------------------------------

/// A handler for one event type.
///
/// Handlers may have side effects on the queue and preference store, but
/// must not leak errors past their `Result`: the dispatcher logs failures
/// and moves on. A handler composes further pipeline work by returning
/// follow-up events, which the dispatcher dispatches after the current
/// round completes.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in failure logs.
    fn name(&self) -> &'static str;

    /// React to an event, optionally producing follow-up events.
    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError>;
}

/// Mapping from event type to its ordered handler list.
///
/// Registration appends; it never overwrites prior registrations for the
/// same type. Built during process initialization, then handed to the
/// dispatcher and never mutated again.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventType, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event type, appending to any existing
    /// registrations.
    pub fn register(&mut self, event_type: EventType, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event_type = %event_type, handler = handler.name(), "Registered handler");
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// The handlers registered for an event type, in registration order.
    pub fn handlers_for(&self, event_type: EventType) -> &[Arc<dyn EventHandler>] {
        self.handlers
            .get(&event_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Executes all registered handlers for each dispatched event.
pub struct EventDispatcher {
    registry: HandlerRegistry,
    bus: Arc<EventBus>,
}

impl EventDispatcher {
    /// Build a dispatcher over an initialized registry and bus.
    pub fn new(registry: HandlerRegistry, bus: Arc<EventBus>) -> Self {
        Self { registry, bus }
    }

    /// Dispatch an event: broadcast it, run its handlers concurrently, and
    /// then dispatch any follow-up events the handlers produced.
    ///
    /// Infallible from the caller's point of view: handler failures are
    /// logged, never returned. The call awaits handler completion so that
    /// failures can be aggregated deterministically; callers wanting
    /// fire-and-forget latency spawn the dispatch itself.
    pub async fn dispatch(&self, event: UserEvent) {
        let mut queue = VecDeque::new();
        queue.push_back((event, 0usize));

        while let Some((event, depth)) = queue.pop_front() {
            let follow_ups = self.dispatch_one(&event).await;

            if follow_ups.is_empty() {
                continue;
            }
            if depth + 1 >= MAX_DISPATCH_DEPTH {
                tracing::warn!(
                    event_type = %event.event_type,
                    depth,
                    dropped = follow_ups.len(),
                    "Follow-up dispatch depth exceeded, dropping events"
                );
                continue;
            }
            for follow_up in follow_ups {
                queue.push_back((follow_up, depth + 1));
            }
        }
    }

    /// Run one event through the bus and its handler list, collecting
    /// follow-up events from handlers that succeeded.
    async fn dispatch_one(&self, event: &UserEvent) -> Vec<UserEvent> {
        // Broadcast first: external subscribers observe the raw event
        // regardless of what the handlers do. Publish failures cannot occur
        // beyond "no receivers", which the bus already swallows.
        self.bus.publish(event.clone());

        let handlers = self.registry.handlers_for(event.event_type);
        if handlers.is_empty() {
            // Not an error: many event types exist for future wiring.
            tracing::debug!(event_type = %event.event_type, "No handlers registered");
            return Vec::new();
        }

        tracing::info!(
            event_type = %event.event_type,
            actor = %event.actor,
            target = event.target.as_deref().unwrap_or("-"),
            handler_count = handlers.len(),
            "Dispatching event"
        );

        let tasks: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                let event = event.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(HANDLER_TIMEOUT, handler.handle(&event)).await {
                        Ok(Ok(follow_ups)) => follow_ups,
                        Ok(Err(e)) => {
                            tracing::error!(
                                handler = handler.name(),
                                event_type = %event.event_type,
                                actor = %event.actor,
                                error = %e,
                                "Event handler failed"
                            );
                            Vec::new()
                        }
                        Err(_) => {
                            tracing::error!(
                                handler = handler.name(),
                                event_type = %event.event_type,
                                timeout_secs = HANDLER_TIMEOUT.as_secs(),
                                "Event handler timed out"
                            );
                            Vec::new()
                        }
                    }
                })
            })
            .collect();

        let mut follow_ups = Vec::new();
        for (result, handler) in join_all(tasks).await.into_iter().zip(handlers) {
            match result {
                Ok(events) => follow_ups.extend(events),
                Err(e) => {
                    // JoinError: the handler task panicked.
                    tracing::error!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        error = %e,
                        "Event handler panicked"
                    );
                }
            }
        }
        follow_ups
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
