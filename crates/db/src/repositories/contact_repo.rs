//! Repository for the `user_contacts` table.

use amoria_core::Channel;
use sqlx::PgPool;

/// Provides delivery-address lookups for transports.
pub struct ContactRepo;

impl ContactRepo {
    /// The delivery address for a user on a channel, if one is on file.
    pub async fn address_for(
        pool: &PgPool,
        username: &str,
        channel: Channel,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT address FROM user_contacts \
             WHERE username = $1 AND channel = $2",
        )
        .bind(username)
        .bind(channel.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Insert or replace a user's address for a channel.
    pub async fn upsert(
        pool: &PgPool,
        username: &str,
        channel: Channel,
        address: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_contacts (username, channel, address) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (username, channel) DO UPDATE SET \
                address = EXCLUDED.address, \
                updated_at = NOW()",
        )
        .bind(username)
        .bind(channel.as_str())
        .bind(address)
        .execute(pool)
        .await?;
        Ok(())
    }
}
