//! The enqueue path handlers use to create notification queue entries.

use amoria_core::types::Timestamp;
use amoria_core::{Priority, TriggerType};
use amoria_db::models::queue::{NewQueueEntry, QueueEntry};
use amoria_db::repositories::QueueRepo;
use amoria_db::DbPool;

use crate::resolver::{NotifyError, PreferenceResolver};

/// Resolves preferences and writes queue entries.
pub struct Notifier;

impl Notifier {
    /// Queue a notification for `recipient`, resolving their preferences
    /// as of `at` (usually the event's `occurred_at`).
    ///
    /// When the recipient has the trigger disabled (or rate limits have
    /// exhausted every channel), a terminal `skipped` entry is recorded
    /// for the audit window instead, and no delivery happens.
    pub async fn queue_notification(
        pool: &DbPool,
        recipient: &str,
        trigger: TriggerType,
        priority: Priority,
        payload: serde_json::Value,
        at: Timestamp,
    ) -> Result<QueueEntry, NotifyError> {
        let resolution = PreferenceResolver::resolve(pool, recipient, trigger, at).await?;

        if resolution.channels.is_empty() {
            tracing::debug!(
                recipient,
                trigger = %trigger,
                "No channels resolved, recording skipped entry"
            );
            return QueueRepo::enqueue_skipped(pool, recipient, trigger, &payload)
                .await
                .map_err(NotifyError::Queue);
        }

        let entry = NewQueueEntry {
            recipient: recipient.to_string(),
            trigger,
            channels: resolution.channels,
            priority,
            payload,
            scheduled_for: resolution.deferred_until,
        };

        let queued = QueueRepo::enqueue(pool, &entry)
            .await
            .map_err(NotifyError::Queue)?;

        tracing::info!(
            recipient,
            trigger = %trigger,
            priority = %priority,
            entry_id = queued.id,
            deferred = queued.scheduled_for > queued.created_at,
            "Notification queued"
        );
        Ok(queued)
    }
}
