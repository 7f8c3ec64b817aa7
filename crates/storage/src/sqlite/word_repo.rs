use quiz_core::model::{Word, WordId};

use super::SqliteRepository;
use super::mapping::{map_word_row, read_err, word_id_to_i64, write_err};
use crate::repository::{StorageError, WordRepository};

#[async_trait::async_trait]
impl WordRepository for SqliteRepository {
    async fn insert_words(&self, words: &[Word]) -> Result<(), StorageError> {
        // Rolled back on drop if any insert fails.
        let mut tx = self.pool.begin().await.map_err(read_err)?;

        for word in words {
            let id = word_id_to_i64(word.id())
                .ok_or_else(|| StorageError::Serialization("word_id overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO words (id, headword, meaning, example, audio_key)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(id)
            .bind(word.headword())
            .bind(word.meaning())
            .bind(word.example())
            .bind(word.audio_key())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;
        Ok(())
    }

    async fn list_words(&self) -> Result<Vec<Word>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, headword, meaning, example, audio_key
            FROM words
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError> {
        let Some(id) = word_id_to_i64(id) else {
            return Ok(None);
        };
        let row = sqlx::query(
            r"
            SELECT id, headword, meaning, example, audio_key
            FROM words
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        row.as_ref().map(map_word_row).transpose()
    }

    async fn count_words(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words")
            .fetch_one(&self.pool)
            .await
            .map_err(read_err)?;
        u64::try_from(count).map_err(|_| StorageError::Serialization("negative count".into()))
    }
}
