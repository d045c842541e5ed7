//! Shortlist events.

use amoria_core::{Priority, TriggerType};
use amoria_db::repositories::QueueRepo;
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

/// Notifies a user they were shortlisted.
pub struct ShortlistAddedHandler {
    pool: DbPool,
}

impl ShortlistAddedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for ShortlistAddedHandler {
    fn name(&self) -> &'static str {
        "shortlist_added"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::ShortlistAdded,
            Priority::Normal,
            serde_json::json!({ "from": event.actor }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}

/// Cancels a pending shortlist notification when the entry is withdrawn.
pub struct ShortlistRemovedHandler {
    pool: DbPool,
}

impl ShortlistRemovedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for ShortlistRemovedHandler {
    fn name(&self) -> &'static str {
        "shortlist_removed"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        let cancelled = QueueRepo::cancel_pending_from(
            &self.pool,
            target,
            TriggerType::ShortlistAdded,
            &event.actor,
        )
        .await?;
        if cancelled > 0 {
            tracing::info!(
                actor = %event.actor,
                target,
                cancelled,
                "Cancelled pending shortlist notifications"
            );
        }
        Ok(Vec::new())
    }
}
