//! Repository for the `favorites` table.

use sqlx::PgPool;

/// Provides interest-relation operations for favorites.
pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Record that `username` favorited `other_username`.
    ///
    /// Returns `true` when a new row was inserted, `false` when the
    /// relation already existed.
    pub async fn add(
        pool: &PgPool,
        username: &str,
        other_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO favorites (username, other_username) \
             VALUES ($1, $2) \
             ON CONFLICT (username, other_username) DO NOTHING",
        )
        .bind(username)
        .bind(other_username)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a favorite relation. Returns `true` if a row was deleted.
    pub async fn remove(
        pool: &PgPool,
        username: &str,
        other_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM favorites WHERE username = $1 AND other_username = $2")
                .bind(username)
                .bind(other_username)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether `username` has favorited `other_username`.
    pub async fn exists(
        pool: &PgPool,
        username: &str,
        other_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT TRUE FROM favorites \
             WHERE username = $1 AND other_username = $2 \
             LIMIT 1",
        )
        .bind(username)
        .bind(other_username)
        .fetch_optional(pool)
        .await?;
        Ok(exists.unwrap_or(false))
    }
}
