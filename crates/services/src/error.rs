//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::generator::GenerationError;
use quiz_core::grading::GradingError;
use quiz_core::model::WordError;
use quiz_core::quiz::QuizError;
use storage::repository::StorageError;

/// Errors emitted by the quiz loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no words available for a quiz")]
    Empty,
    #[error("session has not finished yet")]
    NotFinished,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a word corpus.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CorpusError {
    #[error("corpus file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("corpus is not a valid word list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid word in corpus: {0}")]
    Word(#[from] WordError),
    #[error("corpus contains no words")]
    Empty,
}

/// Errors emitted by the offline asset cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OfflineError {
    #[error("asset {path} could not be fetched: {reason}")]
    Fetch { path: String, reason: String },
}

/// Errors emitted by app-level services (seeding, stats).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}
