//! Delivery worker configuration loaded from environment variables.

use std::time::Duration;

use amoria_core::Channel;

/// Per-run settings shared by every worker, with per-channel poll
/// intervals.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Poll interval for the email worker.
    pub email_poll_interval: Duration,
    /// Poll interval for the SMS worker.
    pub sms_poll_interval: Duration,
    /// Poll interval for the push worker.
    pub push_poll_interval: Duration,
    /// Maximum entries claimed per run.
    pub batch_size: i64,
    /// Age after which an in-flight claim is considered abandoned.
    pub lease_secs: i64,
    /// Upper bound on a single transport send.
    pub send_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `EMAIL_POLL_INTERVAL_SECS` | `60`    |
    /// | `SMS_POLL_INTERVAL_SECS`   | `30`    |
    /// | `PUSH_POLL_INTERVAL_SECS`  | `30`    |
    /// | `DELIVERY_BATCH_SIZE`      | `100`   |
    /// | `CLAIM_LEASE_SECS`         | `300`   |
    /// | `SEND_TIMEOUT_SECS`        | `30`    |
    pub fn from_env() -> Self {
        Self {
            email_poll_interval: Duration::from_secs(env_u64("EMAIL_POLL_INTERVAL_SECS", 60)),
            sms_poll_interval: Duration::from_secs(env_u64("SMS_POLL_INTERVAL_SECS", 30)),
            push_poll_interval: Duration::from_secs(env_u64("PUSH_POLL_INTERVAL_SECS", 30)),
            batch_size: env_u64("DELIVERY_BATCH_SIZE", 100) as i64,
            lease_secs: env_u64("CLAIM_LEASE_SECS", 300) as i64,
            send_timeout: Duration::from_secs(env_u64("SEND_TIMEOUT_SECS", 30)),
        }
    }

    /// The poll interval for a channel's worker.
    pub fn poll_interval(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Email => self.email_poll_interval,
            Channel::Sms => self.sms_poll_interval,
            Channel::Push => self.push_poll_interval,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            email_poll_interval: Duration::from_secs(60),
            sms_poll_interval: Duration::from_secs(30),
            push_poll_interval: Duration::from_secs(30),
            batch_size: 100,
            lease_secs: 300,
            send_timeout: Duration::from_secs(30),
        }
    }
}

/// Read a u64 env var, falling back to `default` when unset or invalid.
fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
