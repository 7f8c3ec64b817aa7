use quiz_core::model::{Progress, Word, WordId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{
    MetaRepository, ProgressRepository, Storage, StorageError, WordRepository,
};
use storage::sqlite::SqliteRepository;

fn build_word(id: u64, headword: &str, meaning: &str) -> Word {
    Word::new(WordId::new(id), headword, meaning).unwrap()
}

fn corpus() -> Vec<Word> {
    vec![
        build_word(1, "abandon", "to give up completely")
            .with_example("They had to abandon their car and walk.")
            .with_audio_key("abandon"),
        build_word(2, "ability", "the power to do something"),
        build_word(3, "absent", "not present"),
        build_word(4, "academy", "a school for special training"),
        build_word(5, "accept", "to agree to take"),
        build_word(6, "accident", "an unplanned event"),
    ]
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

/// A file-backed database, so pooled connections really run in parallel.
/// The files are removed on drop.
struct TempDb {
    path: std::path::PathBuf,
}

impl TempDb {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "quiz_{name}_{}.sqlite3",
            std::process::id()
        ));
        let db = Self { path };
        db.cleanup();
        db
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }

    fn cleanup(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[tokio::test]
async fn sqlite_roundtrips_words_with_optional_fields() {
    let repo = connect("memdb_words_roundtrip").await;
    repo.insert_words(&corpus()).await.unwrap();

    let fetched = repo.get_word(WordId::new(1)).await.unwrap().expect("word");
    assert_eq!(fetched.headword(), "abandon");
    assert_eq!(
        fetched.example(),
        Some("They had to abandon their car and walk.")
    );
    assert_eq!(fetched.audio_key(), Some("abandon"));

    let plain = repo.get_word(WordId::new(2)).await.unwrap().expect("word");
    assert_eq!(plain.example(), None);

    assert!(repo.get_word(WordId::new(99)).await.unwrap().is_none());

    let listed = repo.list_words().await.unwrap();
    assert_eq!(listed, corpus());
    assert_eq!(repo.count_words().await.unwrap(), 6);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.insert_words(&corpus()[..2]).await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.count_words().await.unwrap(), 2);
}

#[tokio::test]
async fn sqlite_bulk_insert_is_atomic() {
    let repo = connect("memdb_atomic_insert").await;
    repo.insert_words(&corpus()).await.unwrap();

    let batch = vec![
        build_word(10, "brand-new", "never seen"),
        build_word(11, "absent", "duplicate headword"),
    ];
    let err = repo.insert_words(&batch).await.unwrap_err();
    assert!(matches!(err, StorageError::ConstraintViolation(_)));
    assert!(repo.get_word(WordId::new(10)).await.unwrap().is_none());
    assert_eq!(repo.count_words().await.unwrap(), 6);

    let batch = vec![build_word(3, "other", "duplicate id")];
    let err = repo.insert_words(&batch).await.unwrap_err();
    assert!(matches!(err, StorageError::ConstraintViolation(_)));
}

#[tokio::test]
async fn sqlite_progress_upserts_one_counter_per_answer() {
    let repo = connect("memdb_progress").await;
    repo.insert_words(&corpus()).await.unwrap();
    let id = WordId::new(4);

    let first = repo.record_answer(id, false).await.unwrap();
    assert_eq!(first, Progress::from_persisted(id, 0, 1));

    repo.record_answer(id, true).await.unwrap();
    let third = repo.record_answer(id, true).await.unwrap();
    assert_eq!(third, Progress::from_persisted(id, 2, 1));

    assert_eq!(repo.get_progress(id).await.unwrap(), Some(third));
    assert!(repo.get_progress(WordId::new(5)).await.unwrap().is_none());

    repo.record_answer(WordId::new(1), true).await.unwrap();
    let all = repo.list_progress().await.unwrap();
    let ids: Vec<u64> = all.iter().map(|p| p.word_id.value()).collect();
    assert_eq!(ids, vec![1, 4]);
}

#[tokio::test]
async fn sqlite_progress_for_unknown_word_is_not_found() {
    let repo = connect("memdb_progress_fk").await;
    let err = repo.record_answer(WordId::new(77), true).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    assert!(repo.list_progress().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_high_score_only_grows() {
    let repo = connect("memdb_high_score").await;
    assert_eq!(repo.high_score().await.unwrap(), 0);
    assert!(!repo.set_high_score_if_greater(0).await.unwrap());

    assert!(repo.set_high_score_if_greater(6).await.unwrap());
    assert!(!repo.set_high_score_if_greater(6).await.unwrap());
    assert!(!repo.set_high_score_if_greater(2).await.unwrap());
    assert_eq!(repo.high_score().await.unwrap(), 6);

    assert!(repo.set_high_score_if_greater(9).await.unwrap());
    assert_eq!(repo.high_score().await.unwrap(), 9);
}

#[tokio::test]
async fn sqlite_storage_samples_deterministically() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_sample?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.bulk_insert(&corpus()).await.unwrap();

    let a = storage
        .sample_words(4, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();
    let b = storage
        .sample_words(4, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();
    assert_eq!(a.len(), 4);
    assert_eq!(a, b);
}

#[tokio::test]
async fn sqlite_unreachable_database_is_unavailable() {
    let result = Storage::sqlite("sqlite:///definitely/missing/dir/quiz.sqlite3").await;
    assert!(matches!(result, Err(StorageError::Unavailable(_))));
}

#[tokio::test]
async fn sqlite_unstorable_ids_are_never_found() {
    let repo = connect("memdb_big_ids").await;
    repo.insert_words(&corpus()).await.unwrap();
    let id = WordId::new(u64::MAX);

    assert!(repo.get_word(id).await.unwrap().is_none());
    assert!(repo.get_progress(id).await.unwrap().is_none());
    let err = repo.record_answer(id, true).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_answers_are_all_counted() {
    let db = TempDb::new("concurrent_answers");
    let storage = Storage::sqlite(&db.url()).await.expect("storage");
    storage.bulk_insert(&corpus()).await.unwrap();
    let id = WordId::new(2);

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
async fn sqlite_concurrent_high_scores_keep_the_maximum() {
    let db = TempDb::new("concurrent_high_score");
    let storage = Storage::sqlite(&db.url()).await.expect("storage");

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
        let updated = updated.unwrap();
        if candidate == 32 {
            assert!(updated, "the maximum always wins");
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
