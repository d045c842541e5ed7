//! Favorite events and mutual-interest detection.
//!
//! When A favorites B, the route layer has already durably recorded the
//! A→B relation before dispatching, so whichever of two near-simultaneous
//! favoriters commits last is guaranteed to observe the other's row: the
//! last writer detects mutuality. The `mutual_matches` insert is the
//! tie-breaker for the truly concurrent case: exactly one detector wins
//! it, and only the winner emits the `mutual_interest` follow-up event.

use amoria_core::{EventType, Priority, TriggerType};
use amoria_db::repositories::{FavoriteRepo, MutualMatchRepo, QueueRepo};
use amoria_db::DbPool;

use crate::dispatcher::{EventHandler, HandlerError};
use crate::event::UserEvent;
use crate::handlers::require_target;
use crate::notifier::Notifier;

// ---------------------------------------------------------------------------
// FavoriteAddedHandler
// ---------------------------------------------------------------------------

/// Decides between a single-interest notification and the mutual path.
pub struct FavoriteAddedHandler {
    pool: DbPool,
}

impl FavoriteAddedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for FavoriteAddedHandler {
    fn name(&self) -> &'static str {
        "favorite_added"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;
        let actor = event.actor.as_str();

        // The actor's relation must already be durable; if it is not, the
        // dispatch raced a rollback and notifying would be wrong.
        if !FavoriteRepo::exists(&self.pool, actor, target).await? {
            tracing::warn!(actor, target, "Favorite relation not found, skipping");
            return Ok(Vec::new());
        }

        if FavoriteRepo::exists(&self.pool, target, actor).await? {
            // Mutual. The normalized-pair insert decides which of two
            // concurrent detectors gets to announce it.
            if MutualMatchRepo::record(&self.pool, actor, target).await? {
                // The plain "favorited" notifications are superseded in
                // both directions.
                QueueRepo::cancel_pending_from(&self.pool, target, TriggerType::Favorited, actor)
                    .await?;
                QueueRepo::cancel_pending_from(&self.pool, actor, TriggerType::Favorited, target)
                    .await?;

                return Ok(vec![UserEvent::new(EventType::MutualInterest, actor)
                    .with_target(target)
                    .with_occurred_at(event.occurred_at)]);
            }
            // The other side's handler already announced this match.
            return Ok(Vec::new());
        }

        Notifier::queue_notification(
            &self.pool,
            target,
            TriggerType::Favorited,
            Priority::Normal,
            serde_json::json!({ "from": actor }),
            event.occurred_at,
        )
        .await?;
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// FavoriteRemovedHandler
// ---------------------------------------------------------------------------

/// Cancels pending notifications when a favorite is withdrawn, so
/// add/remove/add cycles do not double-notify.
pub struct FavoriteRemovedHandler {
    pool: DbPool,
}

impl FavoriteRemovedHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for FavoriteRemovedHandler {
    fn name(&self) -> &'static str {
        "favorite_removed"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;
        let actor = event.actor.as_str();

        let cancelled =
            QueueRepo::cancel_pending_from(&self.pool, target, TriggerType::Favorited, actor)
                .await?;
        if cancelled > 0 {
            tracing::info!(actor, target, cancelled, "Cancelled pending favorite notifications");
        }

        // The pair is no longer mutual; a future re-match may fire again.
        MutualMatchRepo::clear(&self.pool, actor, target).await?;

        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// MutualInterestHandler
// ---------------------------------------------------------------------------

/// Notifies both sides of a new mutual match, high priority.
pub struct MutualInterestHandler {
    pool: DbPool,
}

impl MutualInterestHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventHandler for MutualInterestHandler {
    fn name(&self) -> &'static str {
        "mutual_interest"
    }

    async fn handle(&self, event: &UserEvent) -> Result<Vec<UserEvent>, HandlerError> {
        let target = require_target(event)?;
        let actor = event.actor.as_str();

        for (user, other) in [(actor, target), (target, actor)] {
            Notifier::queue_notification(
                &self.pool,
                user,
                TriggerType::MutualInterest,
                Priority::High,
                serde_json::json!({ "with": other, "matched_at": event.occurred_at }),
                event.occurred_at,
            )
            .await?;
        }

        tracing::info!(actor, target, "Mutual interest notifications queued");
        Ok(Vec::new())
    }
}
