use rand::Rng;

use quiz_core::generator::QuestionGenerator;
use quiz_core::model::Question;
use storage::repository::Storage;

use crate::error::SessionError;

/// Questions picked for one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub questions: Vec<Question>,
}

impl QuizPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Sample `question_count` words uniformly from the store and turn every
    /// sampled word into a question. Choice distractors come from the other
    /// words of the sample only.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty store, `SessionError::Generation`
    /// when distractors run short, or `SessionError::Storage` if words cannot be read.
    pub async fn build<R: Rng + ?Sized>(
        storage: &Storage,
        generator: QuestionGenerator,
        question_count: usize,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let sample = storage.sample_words(question_count, rng).await?;
        if sample.is_empty() {
            return Err(SessionError::Empty);
        }

        let questions = generator.generate(&sample, sample.len(), rng)?;
        Ok(Self { questions })
    }
}
