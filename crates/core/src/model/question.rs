use serde::{Deserialize, Serialize};

use crate::model::word::Word;

/// How a question is posed to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick the meaning from four options.
    Choice,
    /// Type the meaning for a shown headword.
    Typed,
    /// Type the meaning after hearing the headword.
    Audio,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [Self::Choice, Self::Typed, Self::Audio];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::Typed => "typed",
            QuestionKind::Audio => "audio",
        }
    }
}

/// What a revealed hint tells the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Hint {
    /// First character of the meaning.
    StartsWith(char),
    /// Number of characters in the headword.
    HeadwordLength(usize),
}

/// A question derived from a word at generation time. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    word: Word,
    kind: QuestionKind,
    options: Option<Vec<String>>,
}

impl Question {
    /// A choice question. `options` must already contain the correct meaning.
    pub(crate) fn choice(word: Word, options: Vec<String>) -> Self {
        Self {
            word,
            kind: QuestionKind::Choice,
            options: Some(options),
        }
    }

    /// A free-answer question (typed or audio).
    pub(crate) fn free_answer(word: Word, kind: QuestionKind) -> Self {
        debug_assert!(kind != QuestionKind::Choice);
        Self {
            word,
            kind,
            options: None,
        }
    }

    #[must_use]
    pub fn word(&self) -> &Word {
        &self.word
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// Options in display order. Only choice questions have options.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.word.meaning()
    }

    /// The hint for this question, if its kind has one.
    ///
    /// Typed questions reveal the meaning's first character, audio questions the
    /// headword's length. Choice questions already show the answer among the options.
    #[must_use]
    pub fn hint(&self) -> Option<Hint> {
        match self.kind {
            QuestionKind::Choice => None,
            QuestionKind::Typed => self.word.meaning().chars().next().map(Hint::StartsWith),
            QuestionKind::Audio => Some(Hint::HeadwordLength(self.word.headword().chars().count())),
        }
    }

    /// Exact comparison against the word's meaning.
    #[must_use]
    pub fn is_correct(&self, candidate: &str) -> bool {
        candidate == self.word.meaning()
    }
}
