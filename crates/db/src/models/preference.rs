//! Notification preference row model and DTOs.

use std::collections::HashMap;

use amoria_core::types::{DbId, Timestamp};
use amoria_core::{Channel, TriggerType};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub username: String,
    /// Map of trigger type name -> list of channel names.
    pub channel_enablement: serde_json::Value,
    pub quiet_enabled: bool,
    pub quiet_start: String,
    pub quiet_end: String,
    pub quiet_timezone: String,
    /// List of trigger type names that bypass quiet hours.
    pub quiet_exceptions: serde_json::Value,
    /// Map of channel name -> max sends per day.
    pub rate_limits: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    /// Channels enabled for a trigger. An absent trigger key means the
    /// trigger is disabled outright.
    pub fn channels_for(&self, trigger: TriggerType) -> Vec<Channel> {
        self.channel_enablement
            .get(trigger.as_str())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Whether the trigger bypasses quiet hours.
    pub fn is_quiet_exception(&self, trigger: TriggerType) -> bool {
        serde_json::from_value::<Vec<TriggerType>>(self.quiet_exceptions.clone())
            .map(|list| list.contains(&trigger))
            .unwrap_or(false)
    }

    /// Daily send cap for a channel, if one is configured.
    pub fn daily_limit(&self, channel: Channel) -> Option<i64> {
        self.rate_limits
            .get(channel.as_str())
            .and_then(|v| v.as_i64())
    }
}

/// DTO for updating notification preferences. `None` fields keep their
/// stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreference {
    pub channel_enablement: Option<HashMap<TriggerType, Vec<Channel>>>,
    pub quiet_enabled: Option<bool>,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    pub quiet_timezone: Option<String>,
    pub quiet_exceptions: Option<Vec<TriggerType>>,
    pub rate_limits: Option<HashMap<Channel, i64>>,
}

/// System defaults applied when a user's preference row is first created.
///
/// The enablement matrix mirrors the platform's launch configuration:
/// interest triggers favor email, conversational triggers favor the
/// real-time channels, and the security/access triggers are also quiet-hour
/// exceptions.
pub fn default_channel_enablement() -> serde_json::Value {
    serde_json::json!({
        "favorited": ["email", "push"],
        "mutual_interest": ["email", "sms", "push"],
        "shortlist_added": ["email"],
        "profile_view": ["push"],
        "new_message": ["sms", "push"],
        "access_requested": ["email", "sms"],
        "access_granted": ["email", "push"],
        "access_denied": ["email"],
        "account_suspended": ["email", "sms"],
        "suspicious_login": ["email", "sms"],
    })
}

/// Default quiet-hour exception triggers.
pub fn default_quiet_exceptions() -> serde_json::Value {
    serde_json::json!(["access_requested", "suspicious_login"])
}

/// Default per-channel daily rate limits.
pub fn default_rate_limits() -> serde_json::Value {
    serde_json::json!({ "sms": 5, "email": 20 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> NotificationPreference {
        NotificationPreference {
            id: 1,
            username: "alice".into(),
            channel_enablement: default_channel_enablement(),
            quiet_enabled: true,
            quiet_start: "22:00".into(),
            quiet_end: "08:00".into(),
            quiet_timezone: "UTC".into(),
            quiet_exceptions: default_quiet_exceptions(),
            rate_limits: default_rate_limits(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn channels_for_known_trigger() {
        let prefs = sample();
        assert_eq!(
            prefs.channels_for(TriggerType::Favorited),
            vec![Channel::Email, Channel::Push]
        );
    }

    #[test]
    fn absent_trigger_means_disabled() {
        let mut prefs = sample();
        prefs.channel_enablement = serde_json::json!({});
        assert!(prefs.channels_for(TriggerType::Favorited).is_empty());
    }

    #[test]
    fn quiet_exceptions_recognized() {
        let prefs = sample();
        assert!(prefs.is_quiet_exception(TriggerType::AccessRequested));
        assert!(!prefs.is_quiet_exception(TriggerType::Favorited));
    }

    #[test]
    fn daily_limits_read_from_map() {
        let prefs = sample();
        assert_eq!(prefs.daily_limit(Channel::Sms), Some(5));
        assert_eq!(prefs.daily_limit(Channel::Push), None);
    }
}
