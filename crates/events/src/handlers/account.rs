//! Administrative and security events.

use amoria_core::{Priority, TriggerType};
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

/// Notifies a user their account was suspended.
pub struct AccountSuspendedHandler {
    pool: DbPool,
}

impl AccountSuspendedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for AccountSuspendedHandler {
    fn name(&self) -> &'static str {
        "account_suspended"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        let reason = event
            .metadata
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("Policy violation");

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::AccountSuspended,
            Priority::High,
            serde_json::json!({
                "reason": reason,
                "until": event.metadata.get("until"),
            }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}

/// Notifies a user of a suspicious login. Quiet-hour exception by
/// default: a security alert must not wait until morning.
pub struct SuspiciousLoginHandler {
    pool: DbPool,
}

impl SuspiciousLoginHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for SuspiciousLoginHandler {
    fn name(&self) -> &'static str {
        "suspicious_login"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::SuspiciousLogin,
            Priority::High,
            serde_json::json!({
                "ip": event.metadata.get("ip"),
                "location": event.metadata.get("location"),
                "device": event.metadata.get("device"),
            }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}
