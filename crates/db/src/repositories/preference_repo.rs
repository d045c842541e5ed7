//! Repository for the `notification_preferences` table.

use sqlx::PgPool;

use crate::models::preference::{
    default_channel_enablement, default_quiet_exceptions, default_rate_limits,
    NotificationPreference, UpdatePreference,
};

/// Column list for `notification_preferences` queries.
const COLUMNS: &str = "id, username, channel_enablement, quiet_enabled, quiet_start, \
    quiet_end, quiet_timezone, quiet_exceptions, rate_limits, created_at, updated_at";

/// Provides access to per-user notification preferences.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Load a user's preferences, creating the row with system defaults on
    /// first access.
    ///
    /// The lazy insert uses `ON CONFLICT DO NOTHING` so concurrent first
    /// reads for the same user converge on a single row.
    pub async fn get_or_create(
        pool: &PgPool,
        username: &str,
    ) -> Result<NotificationPreference, sqlx::Error> {
        sqlx::query(
            "INSERT INTO notification_preferences \
                (username, channel_enablement, quiet_exceptions, rate_limits) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(default_channel_enablement())
        .bind(default_quiet_exceptions())
        .bind(default_rate_limits())
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM notification_preferences WHERE username = $1");
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Update a user's preferences. `None` fields keep their stored value.
    ///
    /// Uses `COALESCE` so a partial update touches only the provided
    /// fields, following the settings-upsert convention.
    pub async fn update(
        pool: &PgPool,
        username: &str,
        updates: &UpdatePreference,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let channel_enablement = updates
            .channel_enablement
            .as_ref()
            .map(|m| serde_json::to_value(m).unwrap_or_default());
        let quiet_exceptions = updates
            .quiet_exceptions
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or_default());
        let rate_limits = updates
            .rate_limits
            .as_ref()
            .map(|m| serde_json::to_value(m).unwrap_or_default());

        let query = format!(
            "UPDATE notification_preferences SET \
                channel_enablement = COALESCE($2, channel_enablement), \
                quiet_enabled = COALESCE($3, quiet_enabled), \
                quiet_start = COALESCE($4, quiet_start), \
                quiet_end = COALESCE($5, quiet_end), \
                quiet_timezone = COALESCE($6, quiet_timezone), \
                quiet_exceptions = COALESCE($7, quiet_exceptions), \
                rate_limits = COALESCE($8, rate_limits), \
                updated_at = NOW() \
             WHERE username = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(username)
            .bind(channel_enablement)
            .bind(updates.quiet_enabled)
            .bind(updates.quiet_start.as_deref())
            .bind(updates.quiet_end.as_deref())
            .bind(updates.quiet_timezone.as_deref())
            .bind(quiet_exceptions)
            .bind(rate_limits)
            .fetch_one(pool)
            .await
    }

    /// Remove a user's preference row (account deletion).
    pub async fn delete(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notification_preferences WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
