//! Delivery worker behavior against a real queue and a mock transport:
//! success path, retry bound, permanent failures, and the duplicate-send
//! guard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use amoria_core::queue::MAX_ATTEMPTS;
use amoria_core::{Channel, DeliveryOutcome, Priority, QueueStatus, TriggerType};
use amoria_db::models::queue::NewQueueEntry;
use amoria_db::repositories::{ContactRepo, DeliveryLogRepo, QueueRepo};
use amoria_worker::render::RenderedContent;
use amoria_worker::transport::{SendReceipt, Transport, TransportError};
use amoria_worker::{DeliveryWorker, WorkerConfig};
use sqlx::PgPool;

/// What the mock does on every send.
#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    FailTransient,
    FailPermanent,
}

/// Transport double that counts calls.
struct MockTransport {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockTransport {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        _address: &str,
        _content: &RenderedContent,
        idempotency_key: &str,
    ) -> Result<SendReceipt, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(SendReceipt {
                provider_id: Some(format!("provider-{idempotency_key}")),
            }),
            Behavior::FailTransient => {
                Err(TransportError::Transient("connection reset".into()))
            }
            Behavior::FailPermanent => {
                Err(TransportError::Permanent("recipient unsubscribed".into()))
            }
        }
    }
}

fn worker(pool: &PgPool, channel: Channel, transport: Arc<MockTransport>) -> DeliveryWorker {
    DeliveryWorker::new(pool.clone(), channel, transport, &WorkerConfig::default())
}

async fn enqueue(pool: &PgPool, recipient: &str, channels: Vec<Channel>) -> i64 {
    QueueRepo::enqueue(
        pool,
        &NewQueueEntry {
            recipient: recipient.to_string(),
            trigger: TriggerType::Favorited,
            channels,
            priority: Priority::Normal,
            payload: serde_json::json!({"from": "bob"}),
            scheduled_for: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Pull a retried entry's schedule back so the next run can claim it.
async fn make_due(pool: &PgPool, id: i64) {
    sqlx::query("UPDATE notification_queue SET scheduled_for = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../db/migrations")]
async fn successful_delivery_marks_sent_and_logs(pool: PgPool) {
    ContactRepo::upsert(&pool, "alice", Channel::Email, "alice@example.com")
        .await
        .unwrap();
    let id = enqueue(&pool, "alice", vec![Channel::Email]).await;

    let transport = MockTransport::new(Behavior::Succeed);
    let stats = worker(&pool, Channel::Email, Arc::clone(&transport))
        .run_batch()
        .await
        .unwrap();

    assert_eq!(stats.claimed, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(transport.calls(), 1);

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Sent));

    let log = DeliveryLogRepo::list_for_recipient(&pool, "alice", 10, 0)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].outcome, DeliveryOutcome::Sent.as_str());
    assert_eq!(
        log[0].provider_id.as_deref(),
        Some(format!("provider-{id}:email").as_str())
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn transient_failures_reach_terminal_failed_at_the_bound(pool: PgPool) {
    ContactRepo::upsert(&pool, "alice", Channel::Email, "alice@example.com")
        .await
        .unwrap();
    let id = enqueue(&pool, "alice", vec![Channel::Email]).await;

    let transport = MockTransport::new(Behavior::FailTransient);
    let w = worker(&pool, Channel::Email, Arc::clone(&transport));

    for attempt in 1..=MAX_ATTEMPTS {
        let stats = w.run_batch().await.unwrap();
        assert_eq!(stats.claimed, 1, "attempt {attempt} should claim the entry");

        let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(entry.attempts, attempt);
        if attempt < MAX_ATTEMPTS {
            assert_eq!(entry.status(), Some(QueueStatus::Pending));
            make_due(&pool, id).await;
        } else {
            assert_eq!(entry.status(), Some(QueueStatus::Failed));
        }
    }

    // Terminal: no further claims, no further sends.
    let stats = w.run_batch().await.unwrap();
    assert_eq!(stats.claimed, 0);
    assert_eq!(transport.calls(), MAX_ATTEMPTS as usize);

    let log = DeliveryLogRepo::list_for_recipient(&pool, "alice", 10, 0)
        .await
        .unwrap();
    assert_eq!(log.len(), MAX_ATTEMPTS as usize);
    assert!(log.iter().all(|r| r.outcome == DeliveryOutcome::Failed.as_str()));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn permanent_failure_is_terminal_without_retry(pool: PgPool) {
    ContactRepo::upsert(&pool, "alice", Channel::Email, "alice@example.com")
        .await
        .unwrap();
    let id = enqueue(&pool, "alice", vec![Channel::Email]).await;

    let transport = MockTransport::new(Behavior::FailPermanent);
    let stats = worker(&pool, Channel::Email, Arc::clone(&transport))
        .run_batch()
        .await
        .unwrap();
    assert_eq!(stats.failed, 1);

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Failed));
    assert_eq!(entry.attempts, 1);
    assert_eq!(transport.calls(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_address_is_a_permanent_failure(pool: PgPool) {
    // No contact row for alice.
    let id = enqueue(&pool, "alice", vec![Channel::Email]).await;

    let transport = MockTransport::new(Behavior::Succeed);
    let stats = worker(&pool, Channel::Email, Arc::clone(&transport))
        .run_batch()
        .await
        .unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(transport.calls(), 0, "transport must not be invoked");

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Failed));
    assert!(entry.last_error.unwrap().contains("no email address"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_send_guard_completes_without_resending(pool: PgPool) {
    ContactRepo::upsert(&pool, "alice", Channel::Email, "alice@example.com")
        .await
        .unwrap();
    let id = enqueue(&pool, "alice", vec![Channel::Email]).await;

    // A prior run sent and crashed before updating the queue.
    DeliveryLogRepo::record(
        &pool,
        id,
        "alice",
        TriggerType::Favorited,
        Channel::Email,
        DeliveryOutcome::Sent,
        Some("provider-crashed-run"),
        None,
    )
    .await
    .unwrap();

    let transport = MockTransport::new(Behavior::Succeed);
    let stats = worker(&pool, Channel::Email, Arc::clone(&transport))
        .run_batch()
        .await
        .unwrap();

    assert_eq!(stats.delivered, 1);
    assert_eq!(transport.calls(), 0, "the guard must skip the transport");

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Sent));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn multi_channel_entry_is_drained_by_each_worker(pool: PgPool) {
    ContactRepo::upsert(&pool, "alice", Channel::Email, "alice@example.com")
        .await
        .unwrap();
    ContactRepo::upsert(&pool, "alice", Channel::Push, "device-token-1")
        .await
        .unwrap();
    let id = enqueue(&pool, "alice", vec![Channel::Email, Channel::Push]).await;

    let email_transport = MockTransport::new(Behavior::Succeed);
    let push_transport = MockTransport::new(Behavior::Succeed);

    worker(&pool, Channel::Email, Arc::clone(&email_transport))
        .run_batch()
        .await
        .unwrap();

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Pending));
    assert_eq!(entry.delivered_set(), vec![Channel::Email]);

    worker(&pool, Channel::Push, Arc::clone(&push_transport))
        .run_batch()
        .await
        .unwrap();

    let entry = QueueRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status(), Some(QueueStatus::Sent));
    assert_eq!(email_transport.calls(), 1);
    assert_eq!(push_transport.calls(), 1);

    // One log row per channel.
    let log = DeliveryLogRepo::list_for_recipient(&pool, "alice", 10, 0)
        .await
        .unwrap();
    assert_eq!(log.len(), 2);
}
