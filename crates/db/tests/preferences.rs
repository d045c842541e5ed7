//! Lazy creation and mutation of notification preferences.

use amoria_core::{Channel, TriggerType};
use amoria_db::models::preference::UpdatePreference;
use amoria_db::repositories::PreferenceRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn first_access_creates_defaults(pool: PgPool) {
    let prefs = PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();

    assert_eq!(prefs.username, "alice");
    assert!(prefs.quiet_enabled);
    assert_eq!(prefs.quiet_start, "22:00");
    assert_eq!(prefs.quiet_end, "08:00");
    assert_eq!(prefs.quiet_timezone, "UTC");
    assert_eq!(
        prefs.channels_for(TriggerType::Favorited),
        vec![Channel::Email, Channel::Push]
    );
    assert!(prefs.is_quiet_exception(TriggerType::AccessRequested));
    assert!(prefs.is_quiet_exception(TriggerType::SuspiciousLogin));
    assert_eq!(prefs.daily_limit(Channel::Sms), Some(5));
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_access_returns_the_same_row(pool: PgPool) {
    let first = PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();
    let second = PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();
    assert_eq!(first.id, second.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn partial_update_keeps_other_fields(pool: PgPool) {
    PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();

    let updates = UpdatePreference {
        quiet_enabled: Some(false),
        ..Default::default()
    };
    let updated = PreferenceRepo::update(&pool, "alice", &updates).await.unwrap();

    assert!(!updated.quiet_enabled);
    // Untouched fields keep their defaults.
    assert_eq!(updated.quiet_start, "22:00");
    assert_eq!(
        updated.channels_for(TriggerType::Favorited),
        vec![Channel::Email, Channel::Push]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn disabling_a_trigger_empties_its_channels(pool: PgPool) {
    PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();

    let mut enablement = std::collections::HashMap::new();
    enablement.insert(TriggerType::Favorited, Vec::<Channel>::new());
    let updates = UpdatePreference {
        channel_enablement: Some(enablement),
        ..Default::default()
    };
    let updated = PreferenceRepo::update(&pool, "alice", &updates).await.unwrap();

    assert!(updated.channels_for(TriggerType::Favorited).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_removes_the_row(pool: PgPool) {
    PreferenceRepo::get_or_create(&pool, "alice").await.unwrap();
    assert!(PreferenceRepo::delete(&pool, "alice").await.unwrap());
    assert!(!PreferenceRepo::delete(&pool, "alice").await.unwrap());
}
