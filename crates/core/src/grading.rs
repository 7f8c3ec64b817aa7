use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::SessionReport;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Letter grade for a finished session, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeLetter {
    S,
    A,
    B,
    C,
    D,
}

impl GradeLetter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GradeLetter::S => "S",
            GradeLetter::A => "A",
            GradeLetter::B => "B",
            GradeLetter::C => "C",
            GradeLetter::D => "D",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            GradeLetter::S => "Perfect!",
            GradeLetter::A => "Excellent!",
            GradeLetter::B => "Good job!",
            GradeLetter::C => "Keep going!",
            GradeLetter::D => "Needs more practice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub letter: GradeLetter,
    pub message: &'static str,
}

/// Map an accuracy percentage to a grade.
///
/// Thresholds: S ≥ 90, A ≥ 80, B ≥ 70, C ≥ 60, otherwise D.
#[must_use]
pub fn grade(accuracy_percent: u32) -> Grade {
    let letter = match accuracy_percent {
        90.. => GradeLetter::S,
        80..=89 => GradeLetter::A,
        70..=79 => GradeLetter::B,
        60..=69 => GradeLetter::C,
        _ => GradeLetter::D,
    };
    Grade {
        letter,
        message: letter.message(),
    }
}

/// `round(100 * correct / total)` in integer arithmetic, halves rounding up.
///
/// # Errors
///
/// Returns `GradingError::InvalidInput` if `total` is zero.
pub fn accuracy_percent(correct: u32, total: u32) -> Result<u32, GradingError> {
    if total == 0 {
        return Err(GradingError::InvalidInput("total questions must be > 0"));
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    Ok(u32::try_from(rounded).unwrap_or(u32::MAX))
}

/// Grade a completed session report.
///
/// # Errors
///
/// Returns `GradingError::InvalidInput` if the report has no questions.
pub fn grade_report(report: &SessionReport) -> Result<Grade, GradingError> {
    let accuracy = accuracy_percent(report.correct_answers(), report.total_questions())?;
    Ok(grade(accuracy))
}
