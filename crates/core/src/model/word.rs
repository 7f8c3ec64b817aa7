use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::WordId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("headword cannot be empty")]
    EmptyHeadword,

    #[error("meaning cannot be empty")]
    EmptyMeaning,

    #[error("word id {0} is out of range")]
    IdOutOfRange(WordId),
}

//
// ─── WORD ──────────────────────────────────────────────────────────────────────
//

/// A single vocabulary entry.
///
/// Words are immutable once built. Identity is the `id`; the `headword` is
/// unique across a store, which storage enforces on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WordDraft", into = "WordDraft")]
pub struct Word {
    id: WordId,
    headword: String,
    meaning: String,
    example: Option<String>,
    audio_key: Option<String>,
}

impl Word {
    /// Creates a word without the optional example sentence or audio key.
    ///
    /// Headword and meaning are trimmed.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if the headword or meaning is blank, or the id
    /// is above [`WordId::MAX`].
    pub fn new(
        id: WordId,
        headword: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<Self, WordError> {
        WordDraft {
            id,
            headword: headword.into(),
            meaning: meaning.into(),
            example: None,
            audio_key: None,
        }
        .validate()
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = non_blank(example.into());
        self
    }

    #[must_use]
    pub fn with_audio_key(mut self, audio_key: impl Into<String>) -> Self {
        self.audio_key = non_blank(audio_key.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> WordId {
        self.id
    }

    #[must_use]
    pub fn headword(&self) -> &str {
        &self.headword
    }

    /// The meaning is the expected answer for every question built from this word.
    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    #[must_use]
    pub fn audio_key(&self) -> Option<&str> {
        self.audio_key.as_deref()
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated word shape, as read from a corpus file or a storage row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDraft {
    pub id: WordId,
    pub headword: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,
}

impl WordDraft {
    /// Validate the draft into a `Word`.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if the headword or meaning is blank, or the id
    /// is above [`WordId::MAX`].
    pub fn validate(self) -> Result<Word, WordError> {
        if self.id > WordId::MAX {
            return Err(WordError::IdOutOfRange(self.id));
        }
        let headword = self.headword.trim();
        if headword.is_empty() {
            return Err(WordError::EmptyHeadword);
        }
        let meaning = self.meaning.trim();
        if meaning.is_empty() {
            return Err(WordError::EmptyMeaning);
        }

        Ok(Word {
            id: self.id,
            headword: headword.to_owned(),
            meaning: meaning.to_owned(),
            example: self.example.and_then(non_blank),
            audio_key: self.audio_key.and_then(non_blank),
        })
    }
}

impl TryFrom<WordDraft> for Word {
    type Error = WordError;

    fn try_from(draft: WordDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Word> for WordDraft {
    fn from(word: Word) -> Self {
        Self {
            id: word.id,
            headword: word.headword,
            meaning: word.meaning,
            example: word.example,
            audio_key: word.audio_key,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_trims_fields() {
        let word = Word::new(WordId::new(1), "  abandon ", " to give up ").unwrap();
        assert_eq!(word.headword(), "abandon");
        assert_eq!(word.meaning(), "to give up");
        assert_eq!(word.example(), None);
    }

    #[test]
    fn blank_headword_is_rejected() {
        let err = Word::new(WordId::new(1), "   ", "x").unwrap_err();
        assert_eq!(err, WordError::EmptyHeadword);
    }

    #[test]
    fn blank_meaning_is_rejected() {
        let err = Word::new(WordId::new(1), "x", "").unwrap_err();
        assert_eq!(err, WordError::EmptyMeaning);
    }

    #[test]
    fn ids_beyond_storage_range_are_rejected() {
        assert!(Word::new(WordId::MAX, "edge", "last storable id").is_ok());

        let too_big = WordId::new(u64::MAX);
        let err = Word::new(too_big, "overflow", "x").unwrap_err();
        assert_eq!(err, WordError::IdOutOfRange(too_big));

        let json = r#"{"id": 18446744073709551615, "headword": "overflow", "meaning": "x"}"#;
        assert!(serde_json::from_str::<Word>(json).is_err());
    }

    #[test]
    fn blank_optional_fields_collapse_to_none() {
        let word = Word::new(WordId::new(1), "ability", "skill")
            .unwrap()
            .with_example(" ")
            .with_audio_key("ability");
        assert_eq!(word.example(), None);
        assert_eq!(word.audio_key(), Some("ability"));
    }

    #[test]
    fn deserializes_corpus_entry() {
        let json = r#"{"id": 3, "headword": "absent", "meaning": "not present",
                       "example": "Why were you absent?", "audioKey": "absent"}"#;
        let word: Word = serde_json::from_str(json).unwrap();
        assert_eq!(word.id(), WordId::new(3));
        assert_eq!(word.example(), Some("Why were you absent?"));
        assert_eq!(word.audio_key(), Some("absent"));
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"{"id": 3, "headword": "", "meaning": "not present"}"#;
        assert!(serde_json::from_str::<Word>(json).is_err());
    }
}
