//! Repository for the `shortlists` table.

use sqlx::PgPool;

/// Provides interest-relation operations for shortlists.
pub struct ShortlistRepo;

impl ShortlistRepo {
    /// Record that `username` shortlisted `other_username`.
    ///
    /// Returns `true` when a new row was inserted.
    pub async fn add(
        pool: &PgPool,
        username: &str,
        other_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO shortlists (username, other_username) \
             VALUES ($1, $2) \
             ON CONFLICT (username, other_username) DO NOTHING",
        )
        .bind(username)
        .bind(other_username)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a shortlist relation. Returns `true` if a row was deleted.
    pub async fn remove(
        pool: &PgPool,
        username: &str,
        other_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM shortlists WHERE username = $1 AND other_username = $2")
                .bind(username)
                .bind(other_username)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
