//! The closed set of platform events the dispatcher understands.
//!
//! Event types are a versioned enumeration, not free-form strings: adding
//! a new user action means adding a variant here and wiring its handlers
//! at startup. The wire/broadcast name of each variant is its snake_case
//! string, and the pub/sub channel it is announced on is
//! `events:<name>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix for per-event-type broadcast channel names.
const EVENT_CHANNEL_PREFIX: &str = "events:";

/// A user or administrative action that may notify someone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FavoriteAdded,
    FavoriteRemoved,
    MutualInterest,
    ShortlistAdded,
    ShortlistRemoved,
    ProfileViewed,
    AccessRequested,
    AccessGranted,
    AccessDenied,
    MessageSent,
    AccountSuspended,
    SuspiciousLogin,
}

impl EventType {
    /// The stable snake_case name used in logs and broadcast payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::FavoriteAdded => "favorite_added",
            EventType::FavoriteRemoved => "favorite_removed",
            EventType::MutualInterest => "mutual_interest",
            EventType::ShortlistAdded => "shortlist_added",
            EventType::ShortlistRemoved => "shortlist_removed",
            EventType::ProfileViewed => "profile_viewed",
            EventType::AccessRequested => "access_requested",
            EventType::AccessGranted => "access_granted",
            EventType::AccessDenied => "access_denied",
            EventType::MessageSent => "message_sent",
            EventType::AccountSuspended => "account_suspended",
            EventType::SuspiciousLogin => "suspicious_login",
        }
    }

    /// The pub/sub channel this event type is broadcast on
    /// (e.g. `events:favorite_added`).
    pub fn channel_name(self) -> String {
        format!("{EVENT_CHANNEL_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorite_added" => Ok(EventType::FavoriteAdded),
            "favorite_removed" => Ok(EventType::FavoriteRemoved),
            "mutual_interest" => Ok(EventType::MutualInterest),
            "shortlist_added" => Ok(EventType::ShortlistAdded),
            "shortlist_removed" => Ok(EventType::ShortlistRemoved),
            "profile_viewed" => Ok(EventType::ProfileViewed),
            "access_requested" => Ok(EventType::AccessRequested),
            "access_granted" => Ok(EventType::AccessGranted),
            "access_denied" => Ok(EventType::AccessDenied),
            "message_sent" => Ok(EventType::MessageSent),
            "account_suspended" => Ok(EventType::AccountSuspended),
            "suspicious_login" => Ok(EventType::SuspiciousLogin),
            other => Err(CoreError::UnknownVariant {
                kind: "event type",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_str() {
        let all = [
            EventType::FavoriteAdded,
            EventType::FavoriteRemoved,
            EventType::MutualInterest,
            EventType::ShortlistAdded,
            EventType::ShortlistRemoved,
            EventType::ProfileViewed,
            EventType::AccessRequested,
            EventType::AccessGranted,
            EventType::AccessDenied,
            EventType::MessageSent,
            EventType::AccountSuspended,
            EventType::SuspiciousLogin,
        ];
        for et in all {
            assert_eq!(et.as_str().parse::<EventType>().unwrap(), et);
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!("profile_exploded".parse::<EventType>().is_err());
    }

    #[test]
    fn channel_name_has_events_prefix() {
        assert_eq!(
            EventType::FavoriteAdded.channel_name(),
            "events:favorite_added"
        );
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_value(EventType::MutualInterest).unwrap();
        assert_eq!(json, serde_json::json!("mutual_interest"));
    }
}
