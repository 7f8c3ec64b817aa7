use quiz_core::model::{Progress, Word, WordDraft, WordId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classify a failed write: uniqueness and foreign-key failures get their own kinds.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::ConstraintViolation(db.message().to_owned());
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn read_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// `None` for ids above `i64::MAX`; no such row can exist.
pub(crate) fn word_id_to_i64(id: WordId) -> Option<i64> {
    i64::try_from(id.value()).ok()
}

pub(crate) fn word_id_from_i64(v: i64) -> Result<WordId, StorageError> {
    u64::try_from(v)
        .map(WordId::new)
        .map_err(|_| StorageError::Serialization("word_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_word_row(row: &sqlx::sqlite::SqliteRow) -> Result<Word, StorageError> {
    WordDraft {
        id: word_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        headword: row.try_get("headword").map_err(ser)?,
        meaning: row.try_get("meaning").map_err(ser)?,
        example: row.try_get("example").map_err(ser)?,
        audio_key: row.try_get("audio_key").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<Progress, StorageError> {
    Ok(Progress::from_persisted(
        word_id_from_i64(row.try_get::<i64, _>("word_id").map_err(ser)?)?,
        u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        u32_from_i64(
            "wrong_count",
            row.try_get::<i64, _>("wrong_count").map_err(ser)?,
        )?,
    ))
}

pub(crate) fn high_score_from_i64(v: i64) -> Result<u32, StorageError> {
    u32_from_i64("high_score", v)
}
