//! Repository for the `notification_queue` table.
//!
//! Handlers only insert; delivery workers claim and update. The claim
//! uses `FOR UPDATE SKIP LOCKED` so concurrent workers of the same
//! channel partition a batch window instead of double-processing it.

use amoria_core::queue::MAX_ATTEMPTS;
use amoria_core::types::{DbId, Timestamp};
use amoria_core::{Channel, QueueStatus, TriggerType};
use sqlx::PgPool;

use crate::models::queue::{NewQueueEntry, QueueEntry, StatusCount};

/// Column list for `notification_queue` queries.
const COLUMNS: &str = "id, recipient, trigger_type, channels, delivered_channels, \
    priority, payload, status, attempts, last_error, created_at, scheduled_for, \
    claimed_at, last_attempted_at";

/// Provides queue operations for handlers and delivery workers.
pub struct QueueRepo;

impl QueueRepo {
    /// Insert a new pending entry.
    pub async fn enqueue(
        pool: &PgPool,
        entry: &NewQueueEntry,
    ) -> Result<QueueEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_queue \
                (recipient, trigger_type, channels, priority, payload, scheduled_for) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW())) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(&entry.recipient)
            .bind(entry.trigger.as_str())
            .bind(serde_json::to_value(&entry.channels).unwrap_or_default())
            .bind(entry.priority.as_str())
            .bind(&entry.payload)
            .bind(entry.scheduled_for)
            .fetch_one(pool)
            .await
    }

    /// Insert a terminal `skipped` entry: preference resolution yielded no
    /// channels, so the notification never enters the worker pipeline but
    /// stays visible in the audit window.
    pub async fn enqueue_skipped(
        pool: &PgPool,
        recipient: &str,
        trigger: TriggerType,
        payload: &serde_json::Value,
    ) -> Result<QueueEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_queue \
                (recipient, trigger_type, payload, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(recipient)
            .bind(trigger.as_str())
            .bind(payload)
            .bind(QueueStatus::Skipped.as_str())
            .fetch_one(pool)
            .await
    }

    /// Atomically claim up to `batch_size` due entries for a channel.
    ///
    /// An entry is claimable when it is `pending` and due, or `in_flight`
    /// with a claim older than `lease_secs` (self-healing lease after a
    /// worker crash), and this worker's channel is requested but not yet
    /// delivered. Claimed entries are marked `in_flight` in the same
    /// statement; `SKIP LOCKED` makes concurrent claims disjoint.
    pub async fn claim_batch(
        pool: &PgPool,
        channel: Channel,
        batch_size: i64,
        lease_secs: i64,
    ) -> Result<Vec<QueueEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_queue \
             SET status = $1, claimed_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM notification_queue \
                 WHERE ((status = $2 AND scheduled_for <= NOW()) \
                        OR (status = $1 AND claimed_at < NOW() - ($3 * INTERVAL '1 second'))) \
                   AND channels @> jsonb_build_array($4::text) \
                   AND NOT delivered_channels @> jsonb_build_array($4::text) \
                 ORDER BY CASE priority \
                     WHEN 'high' THEN 0 WHEN 'normal' THEN 1 ELSE 2 END, \
                     scheduled_for ASC \
                 LIMIT $5 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(QueueStatus::InFlight.as_str())
            .bind(QueueStatus::Pending.as_str())
            .bind(lease_secs)
            .bind(channel.as_str())
            .bind(batch_size)
            .fetch_all(pool)
            .await
    }

    /// Record a successful delivery on one channel.
    ///
    /// Adds the channel to `delivered_channels`; the entry becomes `sent`
    /// once every requested channel is delivered, otherwise it returns to
    /// `pending` for the remaining channels' workers.
    pub async fn mark_channel_delivered(
        pool: &PgPool,
        id: DbId,
        channel: Channel,
    ) -> Result<QueueEntry, sqlx::Error> {
        let query = format!(
            "UPDATE notification_queue \
             SET delivered_channels = delivered_channels || jsonb_build_array($2::text), \
                 status = CASE \
                     WHEN channels <@ (delivered_channels || jsonb_build_array($2::text)) \
                     THEN $3 ELSE $4 END, \
                 last_attempted_at = NOW(), \
                 claimed_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(id)
            .bind(channel.as_str())
            .bind(QueueStatus::Sent.as_str())
            .bind(QueueStatus::Pending.as_str())
            .fetch_one(pool)
            .await
    }

    /// Record a transient delivery failure.
    ///
    /// Increments `attempts`; below the retry bound the entry returns to
    /// `pending` with `scheduled_for` pushed out by `backoff_secs`, at the
    /// bound it becomes terminally `failed`.
    pub async fn mark_retry(
        pool: &PgPool,
        id: DbId,
        error: &str,
        backoff_secs: i64,
    ) -> Result<QueueEntry, sqlx::Error> {
        let query = format!(
            "UPDATE notification_queue \
             SET attempts = attempts + 1, \
                 last_error = $2, \
                 last_attempted_at = NOW(), \
                 claimed_at = NULL, \
                 status = CASE WHEN attempts + 1 >= $3 THEN $4 ELSE $5 END, \
                 scheduled_for = CASE WHEN attempts + 1 >= $3 \
                     THEN scheduled_for \
                     ELSE NOW() + ($6 * INTERVAL '1 second') END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(id)
            .bind(error)
            .bind(MAX_ATTEMPTS)
            .bind(QueueStatus::Failed.as_str())
            .bind(QueueStatus::Pending.as_str())
            .bind(backoff_secs)
            .fetch_one(pool)
            .await
    }

    /// Record a permanent delivery failure (invalid address, unsubscribed).
    /// Terminal; no retry regardless of the attempt count.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<QueueEntry, sqlx::Error> {
        let query = format!(
            "UPDATE notification_queue \
             SET status = $2, \
                 attempts = attempts + 1, \
                 last_error = $3, \
                 last_attempted_at = NOW(), \
                 claimed_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(id)
            .bind(QueueStatus::Failed.as_str())
            .bind(error)
            .fetch_one(pool)
            .await
    }

    /// Delete still-pending entries for a recipient+trigger originating
    /// from a given actor (add/remove/add must not double-notify).
    ///
    /// Matches the enqueue payload convention of a top-level `from` key.
    pub async fn cancel_pending_from(
        pool: &PgPool,
        recipient: &str,
        trigger: TriggerType,
        from_username: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notification_queue \
             WHERE recipient = $1 AND trigger_type = $2 AND status = $3 \
               AND payload->>'from' = $4",
        )
        .bind(recipient)
        .bind(trigger.as_str())
        .bind(QueueStatus::Pending.as_str())
        .bind(from_username)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find an entry by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<QueueEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_queue WHERE id = $1");
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a recipient's entries newest-first (admin/history surface).
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueueEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_queue \
             WHERE recipient = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Entry counts grouped by status (admin surface).
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM notification_queue \
             GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }

    /// Most recent terminally failed entries (admin surface).
    pub async fn list_recent_failures(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<QueueEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_queue \
             WHERE status = $1 \
             ORDER BY last_attempted_at DESC NULLS LAST \
             LIMIT $2"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(QueueStatus::Failed.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete terminal entries older than the audit window.
    pub async fn purge_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notification_queue \
             WHERE status IN ($1, $2, $3) AND created_at < $4",
        )
        .bind(QueueStatus::Sent.as_str())
        .bind(QueueStatus::Failed.as_str())
        .bind(QueueStatus::Skipped.as_str())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
