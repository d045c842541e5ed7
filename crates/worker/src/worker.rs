//! Per-channel delivery worker.
//!
//! A worker polls on a fixed interval, atomically claims a batch of due
//! entries for its channel, and processes each one: duplicate-send
//! guard, address lookup, render, transport send with a bounded timeout,
//! delivery-log append, and the status transition (delivered /
//! retry-with-backoff / terminal failure). Workers are the only writers
//! of `sent`/`failed` status and the sole incrementers of `attempts`.

use std::sync::Arc;
use std::time::Duration;

use amoria_core::backoff::retry_delay;
use amoria_core::{Channel, DeliveryOutcome, TriggerType};
use amoria_db::models::queue::QueueEntry;
use amoria_db::repositories::{ContactRepo, DeliveryLogRepo, QueueRepo};
use amoria_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::render::render;
use crate::transport::{Transport, TransportError};

/// Counters for one batch run, logged per tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub claimed: usize,
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Periodic batch worker for one delivery channel.
pub struct DeliveryWorker {
    pool: DbPool,
    channel: Channel,
    transport: Arc<dyn Transport>,
    batch_size: i64,
    lease_secs: i64,
    send_timeout: Duration,
    poll_interval: Duration,
}

impl DeliveryWorker {
    pub fn new(
        pool: DbPool,
        channel: Channel,
        transport: Arc<dyn Transport>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            pool,
            channel,
            transport,
            batch_size: config.batch_size,
            lease_secs: config.lease_secs,
            send_timeout: config.send_timeout,
            poll_interval: config.poll_interval(channel),
        }
    }

    /// Run the polling loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            channel = %self.channel,
            poll_interval_secs = self.poll_interval.as_secs(),
            batch_size = self.batch_size,
            "Delivery worker started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(channel = %self.channel, "Delivery worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_batch().await {
                        Ok(stats) if stats.claimed > 0 => {
                            tracing::info!(
                                channel = %self.channel,
                                claimed = stats.claimed,
                                delivered = stats.delivered,
                                retried = stats.retried,
                                failed = stats.failed,
                                "Delivery batch processed"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(channel = %self.channel, error = %e, "Delivery batch failed");
                        }
                    }
                }
            }
        }
    }

    /// One batch cycle: claim due entries and process each independently.
    /// A failure on one entry never aborts the rest of the batch.
    pub async fn run_batch(&self) -> Result<BatchStats, sqlx::Error> {
        let claimed =
            QueueRepo::claim_batch(&self.pool, self.channel, self.batch_size, self.lease_secs)
                .await?;

        let mut stats = BatchStats {
            claimed: claimed.len(),
            ..Default::default()
        };

        for entry in claimed {
            let entry_id = entry.id;
            match self.process_entry(entry).await {
                Ok(outcome) => match outcome {
                    EntryOutcome::Delivered => stats.delivered += 1,
                    EntryOutcome::Retried => stats.retried += 1,
                    EntryOutcome::Failed => stats.failed += 1,
                },
                Err(e) => {
                    // Storage hiccup mid-entry: the claim lease will make
                    // the entry eligible again on a later run.
                    tracing::error!(
                        channel = %self.channel,
                        entry_id,
                        error = %e,
                        "Entry processing aborted"
                    );
                }
            }
        }
        Ok(stats)
    }

    /// Deliver one claimed entry on this worker's channel.
    async fn process_entry(&self, entry: QueueEntry) -> Result<EntryOutcome, sqlx::Error> {
        let Some(trigger) = entry.trigger() else {
            tracing::error!(entry_id = entry.id, trigger = %entry.trigger_type, "Unknown trigger");
            QueueRepo::mark_failed(&self.pool, entry.id, "unknown trigger type").await?;
            return Ok(EntryOutcome::Failed);
        };

        // Duplicate-send guard: a prior run may have sent and crashed
        // before updating the queue. The log is the source of truth.
        if DeliveryLogRepo::was_delivered(&self.pool, entry.id, self.channel).await? {
            tracing::warn!(
                entry_id = entry.id,
                channel = %self.channel,
                "Send already logged, completing without re-sending"
            );
            QueueRepo::mark_channel_delivered(&self.pool, entry.id, self.channel).await?;
            return Ok(EntryOutcome::Delivered);
        }

        let address =
            ContactRepo::address_for(&self.pool, &entry.recipient, self.channel).await?;
        let Some(address) = address else {
            let error = format!("no {} address on file", self.channel);
            self.log_attempt(&entry, trigger, DeliveryOutcome::Failed, None, Some(&error))
                .await?;
            QueueRepo::mark_failed(&self.pool, entry.id, &error).await?;
            return Ok(EntryOutcome::Failed);
        };

        let content = render(trigger, &entry.payload, self.channel);
        let idempotency_key = format!("{}:{}", entry.id, self.channel);

        let result = tokio::time::timeout(
            self.send_timeout,
            self.transport.send(&address, &content, &idempotency_key),
        )
        .await
        .unwrap_or_else(|_| {
            Err(TransportError::Transient(format!(
                "send timed out after {}s",
                self.send_timeout.as_secs()
            )))
        });

        match result {
            Ok(receipt) => {
                self.log_attempt(
                    &entry,
                    trigger,
                    DeliveryOutcome::Sent,
                    receipt.provider_id.as_deref(),
                    None,
                )
                .await?;
                let updated =
                    QueueRepo::mark_channel_delivered(&self.pool, entry.id, self.channel).await?;
                tracing::info!(
                    entry_id = entry.id,
                    recipient = %entry.recipient,
                    channel = %self.channel,
                    status = %updated.status,
                    "Notification delivered"
                );
                Ok(EntryOutcome::Delivered)
            }
            Err(e) if e.is_permanent() => {
                let error = e.to_string();
                self.log_attempt(&entry, trigger, DeliveryOutcome::Failed, None, Some(&error))
                    .await?;
                QueueRepo::mark_failed(&self.pool, entry.id, &error).await?;
                tracing::warn!(
                    entry_id = entry.id,
                    recipient = %entry.recipient,
                    channel = %self.channel,
                    error = %error,
                    "Permanent delivery failure"
                );
                Ok(EntryOutcome::Failed)
            }
            Err(e) => {
                let error = e.to_string();
                self.log_attempt(&entry, trigger, DeliveryOutcome::Failed, None, Some(&error))
                    .await?;
                let backoff = retry_delay(entry.attempts + 1);
                let updated =
                    QueueRepo::mark_retry(&self.pool, entry.id, &error, backoff.as_secs() as i64)
                        .await?;
                if updated.status() == Some(amoria_core::QueueStatus::Failed) {
                    tracing::warn!(
                        entry_id = entry.id,
                        attempts = updated.attempts,
                        error = %error,
                        "Retry bound exhausted, entry terminally failed"
                    );
                    Ok(EntryOutcome::Failed)
                } else {
                    tracing::debug!(
                        entry_id = entry.id,
                        attempts = updated.attempts,
                        backoff_secs = backoff.as_secs(),
                        "Transient delivery failure, re-queued"
                    );
                    Ok(EntryOutcome::Retried)
                }
            }
        }
    }

    /// Append one attempt to the delivery log.
    async fn log_attempt(
        &self,
        entry: &QueueEntry,
        trigger: TriggerType,
        outcome: DeliveryOutcome,
        provider_id: Option<&str>,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        DeliveryLogRepo::record(
            &self.pool,
            entry.id,
            &entry.recipient,
            trigger,
            self.channel,
            outcome,
            provider_id,
            error,
        )
        .await?;
        Ok(())
    }
}

/// How one entry's processing concluded.
enum EntryOutcome {
    Delivered,
    Retried,
    Failed,
}
