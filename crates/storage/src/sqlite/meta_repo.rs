use super::SqliteRepository;
use super::mapping::{high_score_from_i64, read_err, write_err};
use crate::repository::{MetaRepository, StorageError};

const HIGH_SCORE_KEY: &str = "high_score";

#[async_trait::async_trait]
impl MetaRepository for SqliteRepository {
    async fn high_score(&self) -> Result<u32, StorageError> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?1")
            .bind(HIGH_SCORE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;

        value.map_or(Ok(0), high_score_from_i64)
    }

    async fn set_high_score_if_greater(&self, candidate: u32) -> Result<bool, StorageError> {
        // The stored value is never below zero, so zero can never beat it.
        if candidate == 0 {
            return Ok(false);
        }

        let res = sqlx::query(
            r"
            INSERT INTO meta (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            WHERE excluded.value > meta.value
            ",
        )
        .bind(HIGH_SCORE_KEY)
        .bind(i64::from(candidate))
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(res.rows_affected() > 0)
    }
}
