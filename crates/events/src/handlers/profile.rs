//! Profile view events. Low priority, push only by default.

use amoria_core::{Priority, TriggerType};
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

/// Notifies a user their profile was viewed.
pub struct ProfileViewedHandler {
    pool: DbPool,
}

impl ProfileViewedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for ProfileViewedHandler {
    fn name(&self) -> &'static str {
        "profile_viewed"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::ProfileView,
            Priority::Low,
            serde_json::json!({ "viewer": event.actor }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}
