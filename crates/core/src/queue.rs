//! Queue entry status machine, priorities, and delivery outcomes.
//!
//! Status transitions are monotonic except the retry edge:
//! `pending -> in_flight -> {sent | pending | failed}`, with `skipped`
//! assigned only at enqueue time (preference resolution yielded no
//! channels) and never entering the worker pipeline. `attempts` only
//! increases; once it reaches [`MAX_ATTEMPTS`] the entry is terminally
//! `failed`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum transport attempts before an entry becomes terminally failed.
pub const MAX_ATTEMPTS: i32 = 3;

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(CoreError::UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Waiting for a delivery worker (or re-queued after a transient failure).
    Pending,
    /// Claimed by a worker; stale claims are reclaimable after the lease
    /// timeout.
    InFlight,
    /// Every requested channel was delivered. Terminal.
    Sent,
    /// Retry bound exhausted or permanent transport failure. Terminal.
    Failed,
    /// Preference resolution yielded no channels at enqueue time. Terminal;
    /// never claimed by a worker.
    Skipped,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::InFlight => "in_flight",
            QueueStatus::Sent => "sent",
            QueueStatus::Failed => "failed",
            QueueStatus::Skipped => "skipped",
        }
    }

    /// Whether the entry can never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueueStatus::Sent | QueueStatus::Failed | QueueStatus::Skipped
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "in_flight" => Ok(QueueStatus::InFlight),
            "sent" => Ok(QueueStatus::Sent),
            "failed" => Ok(QueueStatus::Failed),
            "skipped" => Ok(QueueStatus::Skipped),
            other => Err(CoreError::UnknownVariant {
                kind: "queue status",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome of a single delivery attempt, as recorded in the delivery log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "sent",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(QueueStatus::Sent.is_terminal());
        assert!(QueueStatus::Failed.is_terminal());
        assert!(QueueStatus::Skipped.is_terminal());
        assert!(!QueueStatus::Pending.is_terminal());
        assert!(!QueueStatus::InFlight.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            QueueStatus::Pending,
            QueueStatus::InFlight,
            QueueStatus::Sent,
            QueueStatus::Failed,
            QueueStatus::Skipped,
        ] {
            assert_eq!(status.as_str().parse::<QueueStatus>().unwrap(), status);
        }
    }

    #[test]
    fn priority_round_trips_through_str() {
        for p in [Priority::Low, Priority::Normal, Priority::High] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
    }
}
