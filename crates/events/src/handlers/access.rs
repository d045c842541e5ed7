//! Private-information access request events.
//!
//! Requests are high priority and a quiet-hour exception by default: the
//! recipient asked to be reachable for these.

use amoria_core::{Priority, TriggerType};
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

/// Notifies a user that someone requested access to their private
/// information.
pub struct AccessRequestedHandler {
    pool: DbPool,
}

impl AccessRequestedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for AccessRequestedHandler {
    fn name(&self) -> &'static str {
        "access_requested"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        let kind = event
            .metadata
            .get("kind")
            .and_then(|v| v.as_str())
            .unwrap_or("contact_info");

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::AccessRequested,
            Priority::High,
            serde_json::json!({ "from": event.actor, "kind": kind }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}

/// Notifies the requester their access request was granted. The event's
/// target is the original requester; the actor is the granter.
pub struct AccessGrantedHandler {
    pool: DbPool,
}

impl AccessGrantedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for AccessGrantedHandler {
    fn name(&self) -> &'static str {
        "access_granted"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::AccessGranted,
            Priority::High,
            serde_json::json!({ "from": event.actor }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}

/// Notifies the requester their access request was denied. Deliberately
/// terse: the payload names no one, only the decision.
pub struct AccessDeniedHandler {
    pool: DbPool,
}

impl AccessDeniedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for AccessDeniedHandler {
    fn name(&self) -> &'static str {
        "access_denied"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::AccessDenied,
            Priority::Normal,
            serde_json::json!({}),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}
