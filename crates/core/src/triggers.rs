//! Notification trigger enumeration.
//!
//! A trigger is the semantic category of a notification as the recipient
//! configures it ("someone favorited me", "new message"), distinct from
//! both the platform event that produced it and the channel it is
//! delivered on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The semantic category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Favorited,
    MutualInterest,
    ShortlistAdded,
    ProfileView,
    NewMessage,
    AccessRequested,
    AccessGranted,
    AccessDenied,
    AccountSuspended,
    SuspiciousLogin,
}

impl TriggerType {
    /// Every trigger, in preference-document order.
    pub const ALL: [TriggerType; 10] = [
        TriggerType::Favorited,
        TriggerType::MutualInterest,
        TriggerType::ShortlistAdded,
        TriggerType::ProfileView,
        TriggerType::NewMessage,
        TriggerType::AccessRequested,
        TriggerType::AccessGranted,
        TriggerType::AccessDenied,
        TriggerType::AccountSuspended,
        TriggerType::SuspiciousLogin,
    ];

    /// The stable snake_case name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerType::Favorited => "favorited",
            TriggerType::MutualInterest => "mutual_interest",
            TriggerType::ShortlistAdded => "shortlist_added",
            TriggerType::ProfileView => "profile_view",
            TriggerType::NewMessage => "new_message",
            TriggerType::AccessRequested => "access_requested",
            TriggerType::AccessGranted => "access_granted",
            TriggerType::AccessDenied => "access_denied",
            TriggerType::AccountSuspended => "account_suspended",
            TriggerType::SuspiciousLogin => "suspicious_login",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorited" => Ok(TriggerType::Favorited),
            "mutual_interest" => Ok(TriggerType::MutualInterest),
            "shortlist_added" => Ok(TriggerType::ShortlistAdded),
            "profile_view" => Ok(TriggerType::ProfileView),
            "new_message" => Ok(TriggerType::NewMessage),
            "access_requested" => Ok(TriggerType::AccessRequested),
            "access_granted" => Ok(TriggerType::AccessGranted),
            "access_denied" => Ok(TriggerType::AccessDenied),
            "account_suspended" => Ok(TriggerType::AccountSuspended),
            "suspicious_login" => Ok(TriggerType::SuspiciousLogin),
            other => Err(CoreError::UnknownVariant {
                kind: "trigger type",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_round_trips_through_str() {
        for trigger in TriggerType::ALL {
            assert_eq!(trigger.as_str().parse::<TriggerType>().unwrap(), trigger);
        }
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        assert!("poked".parse::<TriggerType>().is_err());
    }
}
