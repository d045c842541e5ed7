//! Concrete event handlers, wired once at startup.
//!
//! Each handler owns a pool handle, reacts to one event type, and either
//! queues notifications through the [`Notifier`](crate::Notifier) or
//! composes follow-up events (mutual detection). Per-trigger channel and
//! priority defaults live with the handler that enqueues them.

use std::sync::Arc;

use amoria_core::EventType;
use amoria_db::DbPool;

use crate::dispatcher::{HandlerError, HandlerRegistry};
use crate::event::UserEvent;

pub mod access;
pub mod account;
pub mod favorites;
pub mod messages;
pub mod profile;
pub mod shortlist;

pub use access::{AccessDeniedHandler, AccessGrantedHandler, AccessRequestedHandler};
pub use account::{AccountSuspendedHandler, SuspiciousLoginHandler};
pub use favorites::{FavoriteAddedHandler, FavoriteRemovedHandler, MutualInterestHandler};
pub use messages::MessageSentHandler;
pub use profile::ProfileViewedHandler;
pub use shortlist::{ShortlistAddedHandler, ShortlistRemovedHandler};

/// The affected user, or the error every target-requiring handler raises
/// when the event arrived without one.
pub(crate) fn require_target(event: &UserEvent) -> Result<&str, HandlerError> {
    event
        .target
        .as_deref()
        .ok_or(HandlerError::MissingTarget {
            event_type: event.event_type,
        })
}

/// Build the production handler registry: every event type mapped to its
/// launch handlers.
pub fn default_registry(pool: DbPool) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(
        EventType::FavoriteAdded,
        Arc::new(FavoriteAddedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::FavoriteRemoved,
        Arc::new(FavoriteRemovedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::MutualInterest,
        Arc::new(MutualInterestHandler::new(pool.clone())),
    );
    registry.register(
        EventType::ShortlistAdded,
        Arc::new(ShortlistAddedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::ShortlistRemoved,
        Arc::new(ShortlistRemovedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::ProfileViewed,
        Arc::new(ProfileViewedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::MessageSent,
        Arc::new(MessageSentHandler::new(pool.clone())),
    );
    registry.register(
        EventType::AccessRequested,
        Arc::new(AccessRequestedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::AccessGranted,
        Arc::new(AccessGrantedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::AccessDenied,
        Arc::new(AccessDeniedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::AccountSuspended,
        Arc::new(AccountSuspendedHandler::new(pool.clone())),
    );
    registry.register(
        EventType::SuspiciousLogin,
        Arc::new(SuspiciousLoginHandler::new(pool)),
    );

    registry
}
