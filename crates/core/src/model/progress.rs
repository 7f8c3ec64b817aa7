use serde::{Deserialize, Serialize};

use crate::model::ids::WordId;

/// Per-word answer counters.
///
/// Created lazily the first time a word is answered and never deleted. Every
/// answer increments exactly one of the two counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub word_id: WordId,
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl Progress {
    /// Fresh record with both counters at zero.
    #[must_use]
    pub fn new(word_id: WordId) -> Self {
        Self {
            word_id,
            correct_count: 0,
            wrong_count: 0,
        }
    }

    #[must_use]
    pub fn from_persisted(word_id: WordId, correct_count: u32, wrong_count: u32) -> Self {
        Self {
            word_id,
            correct_count,
            wrong_count,
        }
    }

    /// Apply one answer to the counters.
    pub fn record(&mut self, was_correct: bool) {
        if was_correct {
            self.correct_count = self.correct_count.saturating_add(1);
        } else {
            self.wrong_count = self.wrong_count.saturating_add(1);
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct_count.saturating_add(self.wrong_count)
    }
}
