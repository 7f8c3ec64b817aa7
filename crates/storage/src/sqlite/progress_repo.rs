use quiz_core::model::{Progress, WordId};

use super::SqliteRepository;
use super::mapping::{map_progress_row, read_err, word_id_to_i64, write_err};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_answer(
        &self,
        word_id: WordId,
        was_correct: bool,
    ) -> Result<Progress, StorageError> {
        let id = word_id_to_i64(word_id).ok_or(StorageError::NotFound)?;
        let (correct, wrong) = if was_correct { (1_i64, 0_i64) } else { (0, 1) };

        // Single statement: concurrent answers for the same word cannot lose an increment.
        let row = sqlx::query(
            r"
            INSERT INTO progress (word_id, correct_count, wrong_count)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(word_id) DO UPDATE SET
                correct_count = progress.correct_count + excluded.correct_count,
                wrong_count = progress.wrong_count + excluded.wrong_count
            RETURNING word_id, correct_count, wrong_count
            ",
        )
        .bind(id)
        .bind(correct)
        .bind(wrong)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_progress_row(&row)
    }

    async fn get_progress(&self, word_id: WordId) -> Result<Option<Progress>, StorageError> {
        let Some(id) = word_id_to_i64(word_id) else {
            return Ok(None);
        };
        let row = sqlx::query(
            r"
            SELECT word_id, correct_count, wrong_count
            FROM progress
            WHERE word_id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self) -> Result<Vec<Progress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT word_id, correct_count, wrong_count
            FROM progress
            ORDER BY word_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(map_progress_row).collect()
    }
}
