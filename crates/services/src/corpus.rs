//! Word corpora for seeding a store.
//!
//! A corpus is a JSON array of words in the same camelCase shape the store
//! exports: `{ "id", "headword", "meaning", "example"?, "audioKey"? }`.

use std::path::Path;

use quiz_core::model::{Word, WordDraft};

use crate::error::CorpusError;

const BUILTIN_CORPUS: &str = include_str!("../data/sample_words.json");

/// Parse a JSON word list, validating every entry.
///
/// # Errors
///
/// Returns `CorpusError::Parse` for malformed JSON, `CorpusError::Word` for a blank
/// headword or meaning, and `CorpusError::Empty` for an empty list.
pub fn parse_words(json: &str) -> Result<Vec<Word>, CorpusError> {
    let drafts: Vec<WordDraft> = serde_json::from_str(json)?;
    if drafts.is_empty() {
        return Err(CorpusError::Empty);
    }
    let words = drafts
        .into_iter()
        .map(WordDraft::validate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(words)
}

/// Read and parse a corpus file.
///
/// # Errors
///
/// Returns `CorpusError::Io` if the file cannot be read, otherwise as [`parse_words`].
pub fn load_words(path: &Path) -> Result<Vec<Word>, CorpusError> {
    let json = std::fs::read_to_string(path)?;
    let words = parse_words(&json)?;
    tracing::debug!(path = %path.display(), count = words.len(), "loaded corpus");
    Ok(words)
}

/// The bundled twenty-word starter list.
///
/// # Errors
///
/// Only fails if the bundled file is corrupt.
pub fn builtin_words() -> Result<Vec<Word>, CorpusError> {
    parse_words(BUILTIN_CORPUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{WordError, WordId};
    use std::collections::HashSet;

    #[test]
    fn builtin_corpus_is_valid_and_distinct() {
        let words = builtin_words().unwrap();
        assert_eq!(words.len(), 20);

        let headwords: HashSet<_> = words.iter().map(Word::headword).collect();
        let meanings: HashSet<_> = words.iter().map(Word::meaning).collect();
        assert_eq!(headwords.len(), 20);
        assert_eq!(meanings.len(), 20);

        assert_eq!(words[0].id(), WordId::new(1));
        assert_eq!(words[0].audio_key(), Some("abandon"));
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let words = parse_words(r#"[{"id": 7, "headword": "cat", "meaning": "a small pet"}]"#)
            .unwrap();
        assert_eq!(words[0].example(), None);
        assert_eq!(words[0].audio_key(), None);
    }

    #[test]
    fn blank_meaning_is_rejected() {
        let err = parse_words(r#"[{"id": 1, "headword": "cat", "meaning": "  "}]"#).unwrap_err();
        assert!(matches!(err, CorpusError::Word(WordError::EmptyMeaning)));
    }

    #[test]
    fn malformed_or_empty_lists_are_rejected() {
        assert!(matches!(parse_words("{}"), Err(CorpusError::Parse(_))));
        assert!(matches!(parse_words("[]"), Err(CorpusError::Empty)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_words(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CorpusError::Io(_)));
    }
}
