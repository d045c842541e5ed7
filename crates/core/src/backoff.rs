//! Exponential backoff schedule for transient delivery failures.

use std::time::Duration;

/// Base delay for the first retry.
const BASE_DELAY_SECS: u64 = 60;

/// Cap on any single backoff delay.
const MAX_DELAY_SECS: u64 = 3600;

/// Delay before the next attempt, given how many attempts have already
/// failed. Doubles per failed attempt (1 min, 2 min, 4 min, ...) up to
/// [`MAX_DELAY_SECS`].
pub fn retry_delay(failed_attempts: i32) -> Duration {
    let attempts = failed_attempts.max(1) as u32;
    let exp = attempts.saturating_sub(1).min(10);
    let secs = BASE_DELAY_SECS.saturating_mul(1u64 << exp);
    Duration::from_secs(secs.min(MAX_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(retry_delay(1), Duration::from_secs(60));
        assert_eq!(retry_delay(2), Duration::from_secs(120));
        assert_eq!(retry_delay(3), Duration::from_secs(240));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_delay(20), Duration::from_secs(MAX_DELAY_SECS));
    }

    #[test]
    fn zero_attempts_treated_as_first() {
        assert_eq!(retry_delay(0), retry_delay(1));
    }
}
