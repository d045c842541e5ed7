//! End-to-end dispatch scenarios over a real database: mutual detection
//! symmetry, quiet-hour deferral, and preference-driven skipping.

use std::sync::Arc;

use amoria_core::{Channel, EventType, Priority, QueueStatus, TriggerType};
use amoria_core::DeliveryOutcome;
use amoria_db::models::preference::UpdatePreference;
use amoria_db::models::queue::NewQueueEntry;
use amoria_db::repositories::{DeliveryLogRepo, FavoriteRepo, PreferenceRepo, QueueRepo};
use amoria_events::handlers::default_registry;
use amoria_events::{EventBus, EventDispatcher, UserEvent};
use sqlx::PgPool;

fn dispatcher(pool: &PgPool) -> EventDispatcher {
    EventDispatcher::new(default_registry(pool.clone()), Arc::new(EventBus::default()))
}

fn utc(s: &str) -> chrono::DateTime<chrono::Utc> {
    s.parse().unwrap()
}

/// Entries for a recipient filtered by trigger.
async fn entries_for(
    pool: &PgPool,
    recipient: &str,
    trigger: TriggerType,
) -> Vec<amoria_db::models::queue::QueueEntry> {
    QueueRepo::list_for_recipient(pool, recipient, 50, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.trigger() == Some(trigger))
        .collect()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn single_interest_notifies_only_the_target(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    FavoriteRepo::add(&pool, "bob", "alice").await.unwrap();
    dispatcher
        .dispatch(UserEvent::new(EventType::FavoriteAdded, "bob").with_target("alice"))
        .await;

    let to_alice = entries_for(&pool, "alice", TriggerType::Favorited).await;
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0].priority(), Some(Priority::Normal));
    assert_eq!(to_alice[0].payload["from"], "bob");

    assert!(entries_for(&pool, "bob", TriggerType::Favorited)
        .await
        .is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reciprocal_favorite_fires_exactly_one_mutual_event(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // Bob favorited Alice a day earlier: normal single-interest path.
    FavoriteRepo::add(&pool, "bob", "alice").await.unwrap();
    dispatcher
        .dispatch(
            UserEvent::new(EventType::FavoriteAdded, "bob")
                .with_target("alice")
                .with_occurred_at(utc("2025-06-09T12:00:00Z")),
        )
        .await;

    // Alice reciprocates: the mutual path supersedes plain favorites.
    FavoriteRepo::add(&pool, "alice", "bob").await.unwrap();
    dispatcher
        .dispatch(
            UserEvent::new(EventType::FavoriteAdded, "alice")
                .with_target("bob")
                .with_occurred_at(utc("2025-06-10T12:00:00Z")),
        )
        .await;

    // Exactly one mutual_interest entry per user, high priority.
    for (user, other) in [("alice", "bob"), ("bob", "alice")] {
        let mutual = entries_for(&pool, user, TriggerType::MutualInterest).await;
        assert_eq!(mutual.len(), 1, "{user} should have one mutual entry");
        assert_eq!(mutual[0].priority(), Some(Priority::High));
        assert_eq!(mutual[0].payload["with"], other);
    }

    // The earlier plain "favorited" notification to Alice was cancelled if
    // still pending; no new one was created for Bob.
    for user in ["alice", "bob"] {
        for entry in entries_for(&pool, user, TriggerType::Favorited).await {
            assert_ne!(entry.status(), Some(QueueStatus::Pending));
        }
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn near_simultaneous_reciprocal_favorites_fire_one_mutual(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // Both relations are durable before either dispatch runs, so both
    // handlers observe mutuality; the match record decides the winner.
    FavoriteRepo::add(&pool, "alice", "bob").await.unwrap();
    FavoriteRepo::add(&pool, "bob", "alice").await.unwrap();

    tokio::join!(
        dispatcher.dispatch(UserEvent::new(EventType::FavoriteAdded, "alice").with_target("bob")),
        dispatcher.dispatch(UserEvent::new(EventType::FavoriteAdded, "bob").with_target("alice")),
    );

    for user in ["alice", "bob"] {
        let mutual = entries_for(&pool, user, TriggerType::MutualInterest).await;
        assert_eq!(
            mutual.len(),
            1,
            "{user} must be notified exactly once, never zero, never twice"
        );
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn favorite_during_quiet_hours_is_deferred(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // Alice keeps the default preferences: quiet hours 22:00-08:00 UTC,
    // favorited -> email + push.
    FavoriteRepo::add(&pool, "bob", "alice").await.unwrap();
    dispatcher
        .dispatch(
            UserEvent::new(EventType::FavoriteAdded, "bob")
                .with_target("alice")
                .with_occurred_at(utc("2025-06-10T23:00:00Z")),
        )
        .await;

    let to_alice = entries_for(&pool, "alice", TriggerType::Favorited).await;
    assert_eq!(to_alice.len(), 1);
    let entry = &to_alice[0];

    assert_eq!(entry.status(), Some(QueueStatus::Pending));
    assert_eq!(entry.channel_set(), vec![Channel::Email, Channel::Push]);
    assert_eq!(entry.scheduled_for, utc("2025-06-11T08:00:00Z"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn quiet_hour_exception_trigger_is_not_deferred(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // access_requested is a default quiet-hour exception.
    let occurred = utc("2025-06-10T23:00:00Z");
    dispatcher
        .dispatch(
            UserEvent::new(EventType::AccessRequested, "bob")
                .with_target("alice")
                .with_occurred_at(occurred),
        )
        .await;

    let to_alice = entries_for(&pool, "alice", TriggerType::AccessRequested).await;
    assert_eq!(to_alice.len(), 1);
    assert!(to_alice[0].scheduled_for <= chrono::Utc::now());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disabled_trigger_records_a_skipped_entry(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();
    let mut enablement = std::collections::HashMap::new();
    enablement.insert(TriggerType::ProfileView, Vec::<Channel>::new());
    PreferenceRepo::update(
        &pool,
        "alice",
        &UpdatePreference {
            channel_enablement: Some(enablement),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    dispatcher
        .dispatch(UserEvent::new(EventType::ProfileViewed, "bob").with_target("alice"))
        .await;

    let to_alice = entries_for(&pool, "alice", TriggerType::ProfileView).await;
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0].status(), Some(QueueStatus::Skipped));
    assert!(to_alice[0].channel_set().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rate_limited_channel_is_dropped_from_resolution(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // Exhaust Alice's default SMS budget (5/day) with prior sends.
    let seed = QueueRepo::enqueue(
        &pool,
        &NewQueueEntry {
            recipient: "alice".into(),
            trigger: TriggerType::NewMessage,
            channels: vec![Channel::Sms],
            priority: Priority::High,
            payload: serde_json::json!({}),
            scheduled_for: None,
        },
    )
    .await
    .unwrap();
    for _ in 0..5 {
        DeliveryLogRepo::record(
            &pool,
            seed.id,
            "alice",
            TriggerType::NewMessage,
            Channel::Sms,
            DeliveryOutcome::Sent,
            None,
            None,
        )
        .await
        .unwrap();
    }

    dispatcher
        .dispatch(
            UserEvent::new(EventType::MessageSent, "bob")
                .with_target("alice")
                .with_metadata(serde_json::json!({"preview": "hi"})),
        )
        .await;

    // Default new_message channels are sms + push; sms is budget-exhausted.
    let entry = entries_for(&pool, "alice", TriggerType::NewMessage)
        .await
        .into_iter()
        .find(|e| e.payload["from"] == "bob")
        .expect("message notification should be queued");
    assert_eq!(entry.channel_set(), vec![Channel::Push]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unfavorite_cancels_the_pending_notification(pool: PgPool) {
    let dispatcher = dispatcher(&pool);

    // Defer the notification so it is still pending when the actor
    // changes their mind.
    FavoriteRepo::add(&pool, "bob", "alice").await.unwrap();
    dispatcher
        .dispatch(
            UserEvent::new(EventType::FavoriteAdded, "bob")
                .with_target("alice")
                .with_occurred_at(utc("2025-06-10T23:00:00Z")),
        )
        .await;
    assert_eq!(entries_for(&pool, "alice", TriggerType::Favorited).await.len(), 1);

    FavoriteRepo::remove(&pool, "bob", "alice").await.unwrap();
    dispatcher
        .dispatch(UserEvent::new(EventType::FavoriteRemoved, "bob").with_target("alice"))
        .await;

    assert!(entries_for(&pool, "alice", TriggerType::Favorited)
        .await
        .is_empty());
}
