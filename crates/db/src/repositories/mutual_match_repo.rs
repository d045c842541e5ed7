//! Repository for the `mutual_matches` table.
//!
//! The table is the compare-and-set guard behind mutual-interest
//! detection: the pair is stored normalized (lexicographically smaller
//! username first), so when two handlers race to record the same match,
//! exactly one insert affects a row and that caller alone fires the
//! mutual-interest event.

use sqlx::PgPool;

/// Provides the mutual-match compare-and-set.
pub struct MutualMatchRepo;

/// Order a pair of usernames as (lo, hi).
fn normalize<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MutualMatchRepo {
    /// Record the match between two users.
    ///
    /// Returns `true` only for the caller whose insert created the row;
    /// a concurrent or repeated call returns `false`.
    pub async fn record(pool: &PgPool, a: &str, b: &str) -> Result<bool, sqlx::Error> {
        let (lo, hi) = normalize(a, b);
        let result = sqlx::query(
            "INSERT INTO mutual_matches (user_lo, user_hi) \
             VALUES ($1, $2) \
             ON CONFLICT (user_lo, user_hi) DO NOTHING",
        )
        .bind(lo)
        .bind(hi)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear a recorded match (one side withdrew), so a later re-match can
    /// fire again. Returns `true` if a row was deleted.
    pub async fn clear(pool: &PgPool, a: &str, b: &str) -> Result<bool, sqlx::Error> {
        let (lo, hi) = normalize(a, b);
        let result =
            sqlx::query("DELETE FROM mutual_matches WHERE user_lo = $1 AND user_hi = $2")
                .bind(lo)
                .bind(hi)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a match is currently recorded for the pair.
    pub async fn exists(pool: &PgPool, a: &str, b: &str) -> Result<bool, sqlx::Error> {
        let (lo, hi) = normalize(a, b);
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT TRUE FROM mutual_matches \
             WHERE user_lo = $1 AND user_hi = $2 \
             LIMIT 1",
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(pool)
        .await?;
        Ok(exists.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn normalize_orders_lexicographically() {
        assert_eq!(normalize("bob", "alice"), ("alice", "bob"));
        assert_eq!(normalize("alice", "bob"), ("alice", "bob"));
    }
}
