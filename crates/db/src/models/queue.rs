//! Notification queue entry model and DTOs.

use amoria_core::types::{DbId, Timestamp};
use amoria_core::{Channel, Priority, QueueStatus, TriggerType};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_queue` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueueEntry {
    pub id: DbId,
    pub recipient: String,
    pub trigger_type: String,
    /// JSON list of channel names requested at enqueue time.
    pub channels: serde_json::Value,
    /// JSON list of channel names already delivered.
    pub delivered_channels: serde_json::Value,
    pub priority: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub scheduled_for: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub last_attempted_at: Option<Timestamp>,
}

impl QueueEntry {
    /// The typed status, if the stored string is a known variant.
    pub fn status(&self) -> Option<QueueStatus> {
        self.status.parse().ok()
    }

    /// The typed trigger, if the stored string is a known variant.
    pub fn trigger(&self) -> Option<TriggerType> {
        self.trigger_type.parse().ok()
    }

    /// The typed priority, if the stored string is a known variant.
    pub fn priority(&self) -> Option<Priority> {
        self.priority.parse().ok()
    }

    /// Channels requested at enqueue time.
    pub fn channel_set(&self) -> Vec<Channel> {
        serde_json::from_value(self.channels.clone()).unwrap_or_default()
    }

    /// Channels already delivered.
    pub fn delivered_set(&self) -> Vec<Channel> {
        serde_json::from_value(self.delivered_channels.clone()).unwrap_or_default()
    }
}

/// Input for a new queue entry.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    pub recipient: String,
    pub trigger: TriggerType,
    pub channels: Vec<Channel>,
    pub priority: Priority,
    pub payload: serde_json::Value,
    /// Deferred first-delivery time (quiet hours); `None` means now.
    pub scheduled_for: Option<Timestamp>,
}

/// Queue counts by status, for the admin read surface.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(channels: serde_json::Value, delivered: serde_json::Value) -> QueueEntry {
        QueueEntry {
            id: 1,
            recipient: "alice".into(),
            trigger_type: "favorited".into(),
            channels,
            delivered_channels: delivered,
            priority: "normal".into(),
            payload: serde_json::json!({}),
            status: "pending".into(),
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            scheduled_for: Utc::now(),
            claimed_at: None,
            last_attempted_at: None,
        }
    }

    #[test]
    fn typed_accessors_parse_stored_strings() {
        let e = entry(serde_json::json!(["email", "push"]), serde_json::json!([]));
        assert_eq!(e.status(), Some(QueueStatus::Pending));
        assert_eq!(e.trigger(), Some(TriggerType::Favorited));
        assert_eq!(e.priority(), Some(Priority::Normal));
        assert_eq!(e.channel_set(), vec![Channel::Email, Channel::Push]);
    }

    #[test]
    fn delivered_set_parses_stored_list() {
        let e = entry(
            serde_json::json!(["email", "sms", "push"]),
            serde_json::json!(["sms"]),
        );
        assert_eq!(e.delivered_set(), vec![Channel::Sms]);
    }

    #[test]
    fn malformed_channel_list_reads_as_empty() {
        let e = entry(serde_json::json!("not-a-list"), serde_json::json!([]));
        assert!(e.channel_set().is_empty());
    }
}
