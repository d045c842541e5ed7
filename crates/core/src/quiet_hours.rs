//! Quiet-hours window math.
//!
//! A quiet window is a daily wall-clock interval `[start, end)` in the
//! recipient's own timezone. Windows may wrap midnight (22:00–08:00).
//! Containment and the next-window-end computation are pure so they can
//! be tested exhaustively; the preference resolver decides what to do
//! with the answer (defer the notification, or ignore the window for
//! exception triggers).

use chrono::{Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::types::Timestamp;

/// A recipient's configured quiet-hours window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuietWindow {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub timezone: Tz,
}

impl QuietWindow {
    /// Build a window from the stored `HH:MM` strings and IANA timezone
    /// name.
    pub fn new(
        enabled: bool,
        start: &str,
        end: &str,
        timezone: &str,
    ) -> Result<Self, CoreError> {
        let start = parse_hhmm(start)?;
        let end = parse_hhmm(end)?;
        let timezone: Tz = timezone.parse().map_err(|_| CoreError::UnknownVariant {
            kind: "timezone",
            value: timezone.to_string(),
        })?;
        Ok(Self {
            enabled,
            start,
            end,
            timezone,
        })
    }

    /// Whether `at` falls inside the window (recipient-local wall clock).
    ///
    /// A disabled window contains nothing, as does a zero-length window
    /// (`start == end`).
    pub fn contains(&self, at: Timestamp) -> bool {
        if !self.enabled || self.start == self.end {
            return false;
        }
        let local = at.with_timezone(&self.timezone).time();
        if self.start < self.end {
            self.start <= local && local < self.end
        } else {
            // Wraps midnight, e.g. 22:00-08:00.
            local >= self.start || local < self.end
        }
    }

    /// The next moment (UTC) at which the window ends, for an `at` that is
    /// currently inside the window.
    ///
    /// For a wrapping window the evening segment ends tomorrow and the
    /// morning segment ends today. Callers use this as the deferred
    /// `scheduled_for` of a suppressed notification.
    pub fn next_end(&self, at: Timestamp) -> Timestamp {
        let local = at.with_timezone(&self.timezone);
        let wraps = self.start > self.end;
        let end_is_tomorrow = wraps && local.time() >= self.start;

        let mut end_date = local.date_naive();
        if end_is_tomorrow {
            end_date += Duration::days(1);
        }

        let naive_end = end_date.and_time(self.end);
        // `earliest` resolves DST gaps/folds deterministically; if the exact
        // wall-clock time does not exist, slide forward an hour.
        let resolved = self
            .timezone
            .from_local_datetime(&naive_end)
            .earliest()
            .or_else(|| {
                self.timezone
                    .from_local_datetime(&(naive_end + Duration::hours(1)))
                    .earliest()
            });

        match resolved {
            Some(dt) => dt.with_timezone(&chrono::Utc),
            None => at + Duration::hours(1),
        }
    }
}

/// Parse a `HH:MM` wall-clock string.
fn parse_hhmm(s: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| {
        CoreError::Validation(format!("Time must be in HH:MM format, got \"{s}\""))
    })
}
