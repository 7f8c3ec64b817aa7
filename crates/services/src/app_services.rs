use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::{Progress, Word, WordId};
use quiz_core::sound::SoundPlayer;
use storage::repository::Storage;

use crate::Clock;
use crate::config::QuizConfig;
use crate::corpus;
use crate::error::AppServicesError;
use crate::sessions::QuizLoopService;

/// Per-word counters joined with the word they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordStats {
    pub word_id: WordId,
    pub headword: String,
    pub correct_count: u32,
    pub wrong_count: u32,
}

/// Everything the host shows for `stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub high_score: u32,
    pub word_count: u64,
    /// Only words answered at least once, in id order.
    pub words: Vec<WordStats>,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct QuizServices {
    storage: Storage,
    quiz_loop: Arc<QuizLoopService>,
    durable: bool,
}

impl QuizServices {
    /// Open `SQLite` storage, falling back to in-memory storage if it is unavailable.
    ///
    /// The fallback keeps the game playable; progress and the high score are then
    /// lost on exit. Check [`is_durable`](Self::is_durable).
    pub async fn open(
        db_url: &str,
        clock: Clock,
        config: QuizConfig,
        sounds: Arc<dyn SoundPlayer>,
    ) -> Self {
        match Storage::sqlite(db_url).await {
            Ok(storage) => Self::assemble(storage, true, clock, config, sounds),
            Err(err) => {
                tracing::warn!(error = %err, url = db_url, "storage unavailable, using in-memory store");
                Self::in_memory(clock, config, sounds)
            }
        }
    }

    /// Services over ephemeral storage.
    #[must_use]
    pub fn in_memory(clock: Clock, config: QuizConfig, sounds: Arc<dyn SoundPlayer>) -> Self {
        Self::assemble(Storage::in_memory(), false, clock, config, sounds)
    }

    fn assemble(
        storage: Storage,
        durable: bool,
        clock: Clock,
        config: QuizConfig,
        sounds: Arc<dyn SoundPlayer>,
    ) -> Self {
        let quiz_loop = Arc::new(
            QuizLoopService::new(clock, storage.clone(), sounds).with_config(config),
        );
        Self {
            storage,
            quiz_loop,
            durable,
        }
    }

    /// Whether progress survives a restart.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    /// Insert a corpus in one atomic batch. Returns the number of words added.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` with `ConstraintViolation` if any id or
    /// headword already exists; nothing is written in that case.
    pub async fn seed(&self, words: &[Word]) -> Result<usize, AppServicesError> {
        self.storage.bulk_insert(words).await?;
        Ok(words.len())
    }

    /// Seed the bundled corpus when the store has no words yet.
    ///
    /// Returns the number of words added, zero if the store was already populated.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the store cannot be read or written.
    pub async fn ensure_seeded(&self) -> Result<usize, AppServicesError> {
        if self.storage.words.count_words().await? > 0 {
            return Ok(0);
        }
        let words = corpus::builtin_words()?;
        self.seed(&words).await
    }

    /// Collect the high score and per-word counters.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if any collection cannot be read.
    pub async fn stats(&self) -> Result<StatsSnapshot, AppServicesError> {
        let high_score = self.storage.high_score().await?;
        let word_count = self.storage.words.count_words().await?;
        let headwords: BTreeMap<WordId, String> = self
            .storage
            .words
            .list_words()
            .await?
            .into_iter()
            .map(|word| (word.id(), word.headword().to_owned()))
            .collect();

        let words = self
            .storage
            .progress
            .list_progress()
            .await?
            .into_iter()
            .filter(|progress| progress.total() > 0)
            .map(|progress: Progress| WordStats {
                word_id: progress.word_id,
                headword: headwords
                    .get(&progress.word_id)
                    .cloned()
                    .unwrap_or_else(|| progress.word_id.to_string()),
                correct_count: progress.correct_count,
                wrong_count: progress.wrong_count,
            })
            .collect();

        Ok(StatsSnapshot {
            high_score,
            word_count,
            words,
        })
    }
}
