//! Periodic cleanup of terminal queue entries.
//!
//! Spawns a background task that deletes `sent` / `failed` / `skipped`
//! entries older than the configured audit window. Runs on a fixed
//! interval using `tokio::time::interval`. Delivery log rows are kept:
//! they are the long-term audit record.

use std::time::Duration;

use amoria_db::repositories::QueueRepo;
use amoria_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Default audit window: 30 days.
const DEFAULT_RETENTION_DAYS: i64 = 30;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the queue retention loop.
///
/// Deletes terminal entries older than `QUEUE_RETENTION_DAYS` (defaults
/// to 30). Runs until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let retention_days: i64 = std::env::var("QUEUE_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_DAYS);

    tracing::info!(
        retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Queue retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Queue retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match QueueRepo::purge_older_than(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Queue retention: purged terminal entries");
                        } else {
                            tracing::debug!("Queue retention: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Queue retention: cleanup failed");
                    }
                }
            }
        }
    }
}
