//! Delivery channel enumeration.
//!
//! A channel is a delivery medium, distinct from the trigger that caused
//! the notification. The snake_case names must match the values stored in
//! `notification_queue.channels` and `delivery_log.channel`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A notification delivery medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    /// All channels, in delivery-worker spawn order.
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Sms, Channel::Push];

    /// The stable snake_case name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            other => Err(CoreError::UnknownVariant {
                kind: "channel",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_round_trips_through_str() {
        for ch in Channel::ALL {
            assert_eq!(ch.as_str().parse::<Channel>().unwrap(), ch);
        }
    }

    #[test]
    fn unknown_channel_is_rejected() {
        assert!("carrier_pigeon".parse::<Channel>().is_err());
    }
}
