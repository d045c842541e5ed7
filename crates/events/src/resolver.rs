//! Preference resolution: which channels, and when.
//!
//! For a (recipient, trigger, time) triple the resolver loads the
//! recipient's preferences (creating defaults on first contact) and
//! produces the channels to deliver on plus an optional quiet-hours
//! deferral. An empty channel set means "do not enqueue" — the caller
//! records a skipped entry, it is not an error.

use amoria_core::quiet_hours::QuietWindow;
use amoria_core::types::Timestamp;
use amoria_core::{Channel, CoreError, TriggerType};
use amoria_db::repositories::{DeliveryLogRepo, PreferenceRepo};
use amoria_db::DbPool;
use chrono::Duration;

/// Rate limits are accounted over a rolling day.
const RATE_LIMIT_WINDOW_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes of the enqueue path. Handlers fail closed on all of
/// them: enqueue nothing rather than guess.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The preference store was unavailable or returned bad data.
    #[error("Preference lookup failed: {0}")]
    Preference(#[source] sqlx::Error),

    /// The stored preference document could not be interpreted.
    #[error("Invalid preference data: {0}")]
    InvalidPreference(#[from] CoreError),

    /// Writing the queue entry failed.
    #[error("Queue write failed: {0}")]
    Queue(#[source] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The outcome of preference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Channels to deliver on. Empty means the recipient has this trigger
    /// disabled (or rate limits exhausted every channel): do not enqueue.
    pub channels: Vec<Channel>,

    /// When quiet hours are active for a non-exception trigger, the UTC
    /// time the window ends; delivery is deferred until then.
    pub deferred_until: Option<Timestamp>,
}

/// Resolves a recipient's channels for a trigger at a point in time.
pub struct PreferenceResolver;

impl PreferenceResolver {
    /// Compute the channels (and any quiet-hours deferral) for delivering
    /// a `trigger` notification to `recipient` requested at `at`.
    pub async fn resolve(
        pool: &DbPool,
        recipient: &str,
        trigger: TriggerType,
        at: Timestamp,
    ) -> Result<Resolution, NotifyError> {
        let prefs = PreferenceRepo::get_or_create(pool, recipient)
            .await
            .map_err(NotifyError::Preference)?;

        let enabled = prefs.channels_for(trigger);
        if enabled.is_empty() {
            return Ok(Resolution {
                channels: enabled,
                deferred_until: None,
            });
        }

        // Drop channels whose rolling-day send budget is spent.
        let window_start = at - Duration::hours(RATE_LIMIT_WINDOW_HOURS);
        let mut channels = Vec::with_capacity(enabled.len());
        for channel in enabled {
            if let Some(limit) = prefs.daily_limit(channel) {
                let sent = DeliveryLogRepo::count_sent_since(pool, recipient, channel, window_start)
                    .await
                    .map_err(NotifyError::Preference)?;
                if sent >= limit {
                    tracing::debug!(
                        recipient,
                        channel = %channel,
                        limit,
                        "Daily rate limit reached, dropping channel"
                    );
                    continue;
                }
            }
            channels.push(channel);
        }

        if channels.is_empty() {
            return Ok(Resolution {
                channels,
                deferred_until: None,
            });
        }

        // Quiet hours defer delivery unless the trigger is an exception,
        // in which case the window is ignored entirely.
        let mut deferred_until = None;
        if !prefs.is_quiet_exception(trigger) {
            let window = QuietWindow::new(
                prefs.quiet_enabled,
                &prefs.quiet_start,
                &prefs.quiet_end,
                &prefs.quiet_timezone,
            )?;
            if window.contains(at) {
                deferred_until = Some(window.next_end(at));
            }
        }

        Ok(Resolution {
            channels,
            deferred_until,
        })
    }
}
