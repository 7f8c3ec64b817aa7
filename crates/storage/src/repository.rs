use async_trait::async_trait;
use quiz_core::model::{Progress, Word, WordId};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The backing store could not be opened or migrated.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write collided with a uniqueness constraint; nothing was written.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the word collection.
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// Insert a batch of words, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConstraintViolation` if any id or headword collides with
    /// a stored word or with another word in the batch. The collection is unchanged.
    async fn insert_words(&self, words: &[Word]) -> Result<(), StorageError>;

    /// Every stored word, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the words cannot be read.
    async fn list_words(&self) -> Result<Vec<Word>, StorageError>;

    /// Fetch a word by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError>;

    /// Number of stored words.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the count query fails.
    async fn count_words(&self) -> Result<u64, StorageError>;
}

/// Repository contract for per-word answer counters.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upsert the progress record for `word_id`, incrementing exactly one counter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the word does not exist, or other storage errors.
    async fn record_answer(
        &self,
        word_id: WordId,
        was_correct: bool,
    ) -> Result<Progress, StorageError>;

    /// Fetch progress for a single word.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_progress(&self, word_id: WordId) -> Result<Option<Progress>, StorageError>;

    /// Every progress record, ordered by word id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_progress(&self) -> Result<Vec<Progress>, StorageError>;
}

/// Repository contract for scalar metadata.
#[async_trait]
pub trait MetaRepository: Send + Sync {
    /// Stored high score, or 0 when none has been recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read.
    async fn high_score(&self) -> Result<u32, StorageError>;

    /// Store `candidate` iff it is strictly greater than the current high score.
    ///
    /// This is the only write path for the high score. Returns whether it updated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the compare-and-set fails.
    async fn set_high_score_if_greater(&self, candidate: u32) -> Result<bool, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    words: BTreeMap<WordId, Word>,
    progress: BTreeMap<WordId, Progress>,
    high_score: u32,
}

/// In-memory repository for tests and for running without durable storage.
///
/// One mutex guards every collection, so upserts and the high-score
/// compare-and-set are serialized.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl WordRepository for InMemoryRepository {
    async fn insert_words(&self, words: &[Word]) -> Result<(), StorageError> {
        let mut guard = self.lock()?;

        let mut ids = HashSet::with_capacity(words.len());
        let mut headwords: HashSet<&str> = guard.words.values().map(Word::headword).collect();
        for word in words {
            if guard.words.contains_key(&word.id()) || !ids.insert(word.id()) {
                return Err(StorageError::ConstraintViolation(format!(
                    "duplicate word id {}",
                    word.id()
                )));
            }
            if !headwords.insert(word.headword()) {
                return Err(StorageError::ConstraintViolation(format!(
                    "duplicate headword {:?}",
                    word.headword()
                )));
            }
        }
        drop(headwords);

        for word in words {
            guard.words.insert(word.id(), word.clone());
        }
        Ok(())
    }

    async fn list_words(&self) -> Result<Vec<Word>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.words.values().cloned().collect())
    }

    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.words.get(&id).cloned())
    }

    async fn count_words(&self) -> Result<u64, StorageError> {
        let guard = self.lock()?;
        Ok(guard.words.len() as u64)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_answer(
        &self,
        word_id: WordId,
        was_correct: bool,
    ) -> Result<Progress, StorageError> {
        let mut guard = self.lock()?;
        if !guard.words.contains_key(&word_id) {
            return Err(StorageError::NotFound);
        }
        let progress = guard
            .progress
            .entry(word_id)
            .or_insert_with(|| Progress::new(word_id));
        progress.record(was_correct);
        Ok(*progress)
    }

    async fn get_progress(&self, word_id: WordId) -> Result<Option<Progress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.progress.get(&word_id).copied())
    }

    async fn list_progress(&self) -> Result<Vec<Progress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.progress.values().copied().collect())
    }
}

#[async_trait]
impl MetaRepository for InMemoryRepository {
    async fn high_score(&self) -> Result<u32, StorageError> {
        Ok(self.lock()?.high_score)
    }

    async fn set_high_score_if_greater(&self, candidate: u32) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        if candidate > guard.high_score {
            guard.high_score = candidate;
            return Ok(true);
        }
        Ok(false)
    }
}

//
// ─── STORAGE ───────────────────────────────────────────────────────────────────
//

/// The word store: words, progress and meta repositories behind trait objects,
/// so backends can be swapped without touching callers.
#[derive(Clone)]
pub struct Storage {
    pub words: Arc<dyn WordRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub meta: Arc<dyn MetaRepository>,
}

impl Storage {
    /// Ephemeral storage that lives as long as the returned value.
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let words: Arc<dyn WordRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let meta: Arc<dyn MetaRepository> = Arc::new(repo);
        Self {
            words,
            progress,
            meta,
        }
    }

    /// Insert a batch of words atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConstraintViolation` on any id or headword collision.
    pub async fn bulk_insert(&self, words: &[Word]) -> Result<(), StorageError> {
        self.words.insert_words(words).await?;
        tracing::info!(count = words.len(), "inserted words");
        Ok(())
    }

    /// A uniformly shuffled, non-repeating subset of `min(n, total)` words.
    ///
    /// Deterministic for a seeded `rng`, since words are read in id order
    /// before shuffling.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the words cannot be read.
    pub async fn sample_words<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<Word>, StorageError> {
        let mut words = self.words.list_words().await?;
        let take = n.min(words.len());
        let (sampled, _) = words.partial_shuffle(rng, take);
        Ok(sampled.to_vec())
    }

    /// Record one answer for a word.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown word, or other storage errors.
    pub async fn record_answer(
        &self,
        word_id: WordId,
        was_correct: bool,
    ) -> Result<Progress, StorageError> {
        let progress = self.progress.record_answer(word_id, was_correct).await?;
        tracing::debug!(
            word_id = %word_id,
            was_correct,
            correct = progress.correct_count,
            wrong = progress.wrong_count,
            "recorded answer"
        );
        Ok(progress)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read.
    pub async fn high_score(&self) -> Result<u32, StorageError> {
        self.meta.high_score().await
    }

    /// Compare-and-set on the high score. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn set_high_score_if_greater(&self, candidate: u32) -> Result<bool, StorageError> {
        let updated = self.meta.set_high_score_if_greater(candidate).await?;
        if updated {
            tracing::info!(high_score = candidate, "new high score");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn word(id: u64, headword: &str) -> Word {
        Word::new(WordId::new(id), headword, format!("meaning of {headword}")).unwrap()
    }

    fn sample_words() -> Vec<Word> {
        vec![
            word(1, "abandon"),
            word(2, "ability"),
            word(3, "absent"),
            word(4, "academy"),
            word(5, "accept"),
        ]
    }

    #[tokio::test]
    async fn bulk_insert_and_list_in_id_order() {
        let storage = Storage::in_memory();
        let mut words = sample_words();
        words.reverse();
        storage.bulk_insert(&words).await.unwrap();

        let listed = storage.words.list_words().await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|w| w.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(storage.words.count_words().await.unwrap(), 5);
        assert_eq!(
            storage.words.get_word(WordId::new(3)).await.unwrap(),
            Some(word(3, "absent"))
        );
    }

    #[tokio::test]
    async fn duplicate_headword_rejects_whole_batch() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();

        let batch = vec![word(10, "fresh"), word(11, "ability")];
        let err = storage.bulk_insert(&batch).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        assert_eq!(storage.words.count_words().await.unwrap(), 5);
        assert!(storage.words.get_word(WordId::new(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_inside_batch_is_rejected() {
        let storage = Storage::in_memory();
        let batch = vec![word(1, "one"), word(1, "uno")];
        let err = storage.bulk_insert(&batch).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        assert_eq!(storage.words.count_words().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sampling_is_bounded_and_unique() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let three = storage.sample_words(3, &mut rng).await.unwrap();
        assert_eq!(three.len(), 3);
        let unique: HashSet<_> = three.iter().map(Word::id).collect();
        assert_eq!(unique.len(), 3);

        let all = storage.sample_words(50, &mut rng).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn sampling_is_deterministic_with_seed() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();

        let a = storage
            .sample_words(4, &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();
        let b = storage
            .sample_words(4, &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn record_answer_increments_matching_counter() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();
        let id = WordId::new(2);

        assert!(storage.progress.get_progress(id).await.unwrap().is_none());
        storage.record_answer(id, true).await.unwrap();
        let progress = storage.record_answer(id, true).await.unwrap();
        assert_eq!(progress.correct_count, 2);
        assert_eq!(progress.wrong_count, 0);

        let progress = storage.record_answer(id, false).await.unwrap();
        assert_eq!(progress, Progress::from_persisted(id, 2, 1));
        assert_eq!(storage.progress.list_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_answer_for_unknown_word_is_not_found() {
        let storage = Storage::in_memory();
        let err = storage
            .record_answer(WordId::new(404), true)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn high_score_compare_and_set() {
        let storage = Storage::in_memory();
        assert_eq!(storage.high_score().await.unwrap(), 0);
        assert!(!storage.set_high_score_if_greater(0).await.unwrap());

        assert!(storage.set_high_score_if_greater(7).await.unwrap());
        assert!(!storage.set_high_score_if_greater(7).await.unwrap());
        assert!(!storage.set_high_score_if_greater(3).await.unwrap());
        assert_eq!(storage.high_score().await.unwrap(), 7);

        assert!(storage.set_high_score_if_greater(8).await.unwrap());
        assert_eq!(storage.high_score().await.unwrap(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_are_all_counted() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();
        let id = WordId::new(3);

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..40 {
            let storage = storage.clone();
            tasks.spawn(async move { storage.record_answer(id, i % 4 != 0).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let progress = storage.progress.get_progress(id).await.unwrap().unwrap();
        assert_eq!(progress, Progress::from_persisted(id, 30, 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_high_scores_keep_the_maximum() {
        let storage = Storage::in_memory();

        let mut tasks = tokio::task::JoinSet::new();
        for candidate in 1..=32_u32 {
            let storage = storage.clone();
            tasks.spawn(async move {
                let updated = storage.set_high_score_if_greater(candidate).await;
                (candidate, updated)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            let (candidate, updated) = joined.unwrap();
            if candidate == 32 {
                assert!(updated.unwrap(), "the maximum always wins");
            }
        }
        assert_eq!(storage.high_score().await.unwrap(), 32);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let storage = storage.clone();
            tasks.spawn(async move { storage.set_high_score_if_greater(40).await });
        }
        let mut winners = 0;
        while let Some(joined) = tasks.join_next().await {
            if joined.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(storage.high_score().await.unwrap(), 40);
    }

    #[tokio::test]
    async fn unstorable_ids_are_never_found() {
        let storage = Storage::in_memory();
        storage.bulk_insert(&sample_words()).await.unwrap();
        let id = WordId::new(u64::MAX);

        assert!(storage.words.get_word(id).await.unwrap().is_none());
        assert!(storage.progress.get_progress(id).await.unwrap().is_none());
        let err = storage.record_answer(id, true).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
