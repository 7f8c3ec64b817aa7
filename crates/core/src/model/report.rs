use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("correct answers ({correct}) does not match score ({score})")]
    CountMismatch { score: u32, correct: u32 },

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Statistics for a finished quiz session, handed to the host and to grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    score: u32,
    total_questions: u32,
    correct_answers: u32,
    max_streak: u32,
    time_spent_seconds: u64,
}

impl SessionReport {
    /// Build a report, checking that the counters agree.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::CountMismatch` if `correct_answers != score`, or
    /// `ReportError::ScoreExceedsTotal` if the score is larger than the question count.
    pub fn new(
        score: u32,
        total_questions: u32,
        correct_answers: u32,
        max_streak: u32,
        time_spent_seconds: u64,
    ) -> Result<Self, ReportError> {
        if correct_answers != score {
            return Err(ReportError::CountMismatch {
                score,
                correct: correct_answers,
            });
        }
        if score > total_questions {
            return Err(ReportError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }

        Ok(Self {
            score,
            total_questions,
            correct_answers,
            max_streak,
            time_spent_seconds,
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u64 {
        self.time_spent_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_checks_counts() {
        let report = SessionReport::new(7, 10, 7, 4, 63).unwrap();
        assert_eq!(report.correct_answers(), report.score());

        let err = SessionReport::new(7, 10, 6, 4, 63).unwrap_err();
        assert!(matches!(err, ReportError::CountMismatch { score: 7, correct: 6 }));

        let err = SessionReport::new(11, 10, 11, 4, 63).unwrap_err();
        assert!(matches!(err, ReportError::ScoreExceedsTotal { .. }));
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = SessionReport::new(3, 5, 3, 2, 40).unwrap();
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["totalQuestions"], 5);
        assert_eq!(json["timeSpentSeconds"], 40);
    }
}
