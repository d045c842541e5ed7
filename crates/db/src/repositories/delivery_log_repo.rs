//! Repository for the append-only `delivery_log` table.

use amoria_core::types::{DbId, Timestamp};
use amoria_core::{Channel, DeliveryOutcome, TriggerType};
use sqlx::PgPool;

use crate::models::delivery_log::DeliveryRecord;

/// Column list for `delivery_log` queries.
const COLUMNS: &str = "id, queue_entry_id, recipient, trigger_type, channel, \
    outcome, provider_id, error, sent_at";

/// Provides write-once attempt records and the read paths built on them.
pub struct DeliveryLogRepo;

impl DeliveryLogRepo {
    /// Append one attempt record, returning the generated ID.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        pool: &PgPool,
        queue_entry_id: DbId,
        recipient: &str,
        trigger: TriggerType,
        channel: Channel,
        outcome: DeliveryOutcome,
        provider_id: Option<&str>,
        error: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO delivery_log \
                (queue_entry_id, recipient, trigger_type, channel, outcome, provider_id, error) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(queue_entry_id)
        .bind(recipient)
        .bind(trigger.as_str())
        .bind(channel.as_str())
        .bind(outcome.as_str())
        .bind(provider_id)
        .bind(error)
        .fetch_one(pool)
        .await
    }

    /// Whether a successful send is already on record for this entry and
    /// channel. Used as the duplicate-send guard when a worker crashed
    /// between sending and updating the queue status.
    pub async fn was_delivered(
        pool: &PgPool,
        queue_entry_id: DbId,
        channel: Channel,
    ) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT TRUE FROM delivery_log \
             WHERE queue_entry_id = $1 AND channel = $2 AND outcome = $3 \
             LIMIT 1",
        )
        .bind(queue_entry_id)
        .bind(channel.as_str())
        .bind(DeliveryOutcome::Sent.as_str())
        .fetch_optional(pool)
        .await?;
        Ok(exists.unwrap_or(false))
    }

    /// Count successful sends to a recipient on a channel since `since`.
    /// Feeds the per-channel daily rate limits.
    pub async fn count_sent_since(
        pool: &PgPool,
        recipient: &str,
        channel: Channel,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM delivery_log \
             WHERE recipient = $1 AND channel = $2 AND outcome = $3 AND sent_at >= $4",
        )
        .bind(recipient)
        .bind(channel.as_str())
        .bind(DeliveryOutcome::Sent.as_str())
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// A recipient's delivery history, newest-first (admin surface).
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeliveryRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delivery_log \
             WHERE recipient = $1 \
             ORDER BY sent_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, DeliveryRecord>(&query)
            .bind(recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
