use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Question, QuestionKind, Word, WordId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerationError {
    #[error(
        "word {word_id} has only {available} distinct distractor meanings, {needed} required"
    )]
    InsufficientPool {
        word_id: WordId,
        needed: usize,
        available: usize,
    },
}

//
// ─── KIND POLICY ───────────────────────────────────────────────────────────────
//

/// Which question kinds the generator may produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindPolicy {
    /// Uniform pick among choice, typed and audio.
    #[default]
    AllKinds,
    /// Every question is multiple choice.
    ChoiceOnly,
}

impl KindPolicy {
    fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> QuestionKind {
        match self {
            KindPolicy::AllKinds => QuestionKind::ALL[rng.random_range(0..QuestionKind::ALL.len())],
            KindPolicy::ChoiceOnly => QuestionKind::Choice,
        }
    }
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// Number of options on a choice question, the correct meaning included.
pub const CHOICE_OPTIONS: usize = 4;

/// Turns a sampled word list into an ordered question sequence.
///
/// Question order follows the input order; only option order is shuffled.
/// All randomness comes from the caller's RNG so a seeded RNG gives a
/// reproducible quiz.
///
/// # Examples
///
/// ```
/// # use quiz_core::generator::{KindPolicy, QuestionGenerator};
/// # use quiz_core::model::{Word, WordId};
/// use rand::SeedableRng;
///
/// let words: Vec<Word> = ["one", "two", "three", "four"]
///     .iter()
///     .enumerate()
///     .map(|(i, m)| Word::new(WordId::new(i as u64 + 1), format!("w{i}"), *m).unwrap())
///     .collect();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let questions = QuestionGenerator::new(KindPolicy::ChoiceOnly).generate(&words, 2, &mut rng)?;
/// assert_eq!(questions.len(), 2);
/// assert_eq!(questions[0].options().map(<[String]>::len), Some(4));
/// # Ok::<(), quiz_core::generator::GenerationError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionGenerator {
    policy: KindPolicy,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(policy: KindPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> KindPolicy {
        self.policy
    }

    /// Build up to `question_count` questions from the front of `words`.
    ///
    /// Distractors for a word are drawn from the meanings of every other word in
    /// `words`, not only the ones that become questions.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InsufficientPool` if the policy allows choice
    /// questions and some selected word has fewer than three distinct distractor
    /// meanings available. The check does not depend on which kinds the RNG
    /// picks, so a pool is either always accepted or always rejected.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        words: &[Word],
        question_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Question>, GenerationError> {
        let selected = &words[..question_count.min(words.len())];

        let mut pools = Vec::with_capacity(selected.len());
        for word in selected {
            let pool = distractor_pool(word, words);
            if pool.len() < CHOICE_OPTIONS - 1 {
                return Err(GenerationError::InsufficientPool {
                    word_id: word.id(),
                    needed: CHOICE_OPTIONS - 1,
                    available: pool.len(),
                });
            }
            pools.push(pool);
        }

        let mut questions = Vec::with_capacity(selected.len());
        for (word, mut pool) in selected.iter().zip(pools) {
            let question = match self.policy.pick(rng) {
                QuestionKind::Choice => {
                    pool.shuffle(rng);
                    pool.truncate(CHOICE_OPTIONS - 1);
                    let mut options = Vec::with_capacity(CHOICE_OPTIONS);
                    options.push(word.meaning().to_owned());
                    options.extend(pool.into_iter().map(str::to_owned));
                    options.shuffle(rng);
                    Question::choice(word.clone(), options)
                }
                kind => Question::free_answer(word.clone(), kind),
            };
            questions.push(question);
        }

        Ok(questions)
    }
}

/// Distinct meanings of the other words, excluding the correct meaning itself.
fn distractor_pool<'a>(word: &Word, words: &'a [Word]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    seen.insert(word.meaning());
    words
        .iter()
        .filter(|other| other.id() != word.id())
        .map(Word::meaning)
        .filter(|meaning| seen.insert(*meaning))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
