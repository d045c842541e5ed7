//! The canonical event envelope.

use amoria_core::types::Timestamp;
use amoria_core::EventType;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A user or administrative action flowing through the dispatcher.
///
/// Constructed fresh per dispatch via [`UserEvent::new`] and enriched with
/// the builder methods; immutable once dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEvent {
    /// Which action occurred.
    pub event_type: EventType,

    /// Username of the user who performed the action.
    pub actor: String,

    /// Username of the affected user, when the action has one.
    pub target: Option<String>,

    /// Free-form JSON carrying event-specific data (message previews,
    /// suspension reasons, request kinds).
    pub metadata: serde_json::Value,

    /// When the action occurred (UTC).
    pub occurred_at: Timestamp,
}

impl UserEvent {
    /// Create a new event for an actor, occurring now.
    pub fn new(event_type: EventType, actor: impl Into<String>) -> Self {
        Self {
            event_type,
            actor: actor.into(),
            target: None,
            metadata: serde_json::Value::Object(Default::default()),
            occurred_at: Utc::now(),
        }
    }

    /// Attach the affected user.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the JSON metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the occurrence time (callers replaying or testing
    /// time-dependent routing).
    pub fn with_occurred_at(mut self, occurred_at: Timestamp) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// The broadcast channel this event is announced on.
    pub fn channel_name(&self) -> String {
        self.event_type.channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_optional_fields() {
        let event = UserEvent::new(EventType::FavoriteAdded, "bob")
            .with_target("alice")
            .with_metadata(serde_json::json!({"source": "search"}));

        assert_eq!(event.event_type, EventType::FavoriteAdded);
        assert_eq!(event.actor, "bob");
        assert_eq!(event.target.as_deref(), Some("alice"));
        assert_eq!(event.metadata["source"], "search");
    }

    #[test]
    fn bare_event_has_empty_metadata() {
        let event = UserEvent::new(EventType::MessageSent, "bob");
        assert!(event.target.is_none());
        assert!(event.metadata.is_object());
    }

    #[test]
    fn channel_name_comes_from_event_type() {
        let event = UserEvent::new(EventType::MessageSent, "bob");
        assert_eq!(event.channel_name(), "events:message_sent");
    }
}
