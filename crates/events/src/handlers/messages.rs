//! Message events. High priority, real-time channels by default.

use amoria_core::{Priority, TriggerType};
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

/// Notifies a user of a new message, carrying a short preview.
pub struct MessageSentHandler {
    pool: DbPool,
}

impl MessageSentHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for MessageSentHandler {
    fn name(&self) -> &'static str {
        "message_sent"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        let preview = event
            .metadata
            .get("preview")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::NewMessage,
            Priority::High,
            serde_json::json!({ "from": event.actor, "preview": preview }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}
