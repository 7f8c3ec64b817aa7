use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{Hint, Question, ReportError, SessionReport, WordId};

/// Lives at session start; a bonus life never raises lives above this.
pub const MAX_LIVES: u32 = 3;
/// Streak length that earns a bonus life.
pub const BONUS_STREAK: u32 = 5;
/// Hints available at session start.
pub const DEFAULT_HINTS: u32 = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("no hints remaining")]
    NoHintsRemaining,

    #[error("hint already shown for this question")]
    HintAlreadyShown,

    #[error("this question has no hint")]
    NoHintForQuestion,

    #[error(transparent)]
    Report(#[from] ReportError),
}

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where a session is in its lifecycle.
///
/// `Presenting(i)` → `ShowingResult(i, ok)` → `Presenting(i + 1)` or `Completed`.
/// `Abandoned` is entered only through [`QuizSession::abandon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Presenting { index: usize },
    ShowingResult { index: usize, was_correct: bool },
    Completed(SessionReport),
    Abandoned,
}

impl QuizPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::Presenting { .. } => "presenting",
            QuizPhase::ShowingResult { .. } => "showing result",
            QuizPhase::Completed(_) => "completed",
            QuizPhase::Abandoned => "abandoned",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuizPhase::Completed(_) | QuizPhase::Abandoned)
    }
}

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// What happened when an answer was scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub word_id: WordId,
    pub was_correct: bool,
    pub correct_answer: String,
    pub score: u32,
    pub lives: u32,
    pub streak: u32,
    /// A bonus life was earned and lands after the bonus delay.
    pub bonus_life_pending: bool,
    /// The next `advance` will complete the session.
    pub ends_session: bool,
}

/// Result of leaving the result display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Completed(SessionReport),
}

/// Snapshot of session counters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// 1-based number of the question on screen.
    pub current_number: usize,
    pub score: u32,
    pub lives: u32,
    pub streak: u32,
    pub hints_remaining: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one play-through.
///
/// The session owns all of its state and is mutated only through
/// [`submit_answer`](Self::submit_answer), [`use_hint`](Self::use_hint),
/// [`grant_bonus_life`](Self::grant_bonus_life), [`advance`](Self::advance) and
/// [`abandon`](Self::abandon). Timing is the caller's job: the session records
/// that a bonus life is pending or that a result is showing, and the owner
/// decides when the delay has elapsed.
///
/// The session ends once lives reach zero after an answer's deduction, or once
/// the last question has been answered, whichever happens first.
#[derive(Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    answered: usize,
    score: u32,
    lives: u32,
    streak: u32,
    max_streak: u32,
    hints_remaining: u32,
    hint_visible: bool,
    bonus_pending: bool,
    phase: QuizPhase,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session at `Presenting(0)` with full lives and default hints.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        Ok(Self {
            questions,
            current: 0,
            answered: 0,
            score: 0,
            lives: MAX_LIVES,
            streak: 0,
            max_streak: 0,
            hints_remaining: DEFAULT_HINTS,
            hint_visible: false,
            bonus_pending: false,
            phase: QuizPhase::Presenting { index: 0 },
            started_at,
        })
    }

    #[must_use]
    pub fn with_hints(mut self, hints: u32) -> Self {
        self.hints_remaining = hints;
        self
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being presented or whose result is showing.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::Presenting { index } | QuizPhase::ShowingResult { index, .. } => {
                self.questions.get(index)
            }
            QuizPhase::Completed(_) | QuizPhase::Abandoned => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    #[must_use]
    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    /// Whether the hint is visible for the current question.
    #[must_use]
    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    #[must_use]
    pub fn bonus_life_pending(&self) -> bool {
        self.bonus_pending
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, QuizPhase::Completed(_))
    }

    /// Completed or abandoned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    #[must_use]
    pub fn report(&self) -> Option<SessionReport> {
        match self.phase {
            QuizPhase::Completed(report) => Some(report),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answered,
            current_number: (self.current + 1).min(self.questions.len()),
            score: self.score,
            lives: self.lives,
            streak: self.streak,
            hints_remaining: self.hints_remaining,
            is_complete: self.is_complete(),
        }
    }

    /// Score an answer for the current question and enter `ShowingResult`.
    ///
    /// The comparison is an exact string match against the word's meaning.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless the session is presenting a question.
    pub fn submit_answer(&mut self, candidate: &str) -> Result<AnswerOutcome, QuizError> {
        let QuizPhase::Presenting { index } = self.phase else {
            return Err(self.invalid("submit an answer"));
        };
        let question = &self.questions[index];
        let was_correct = question.is_correct(candidate);
        let word_id = question.word().id();
        let correct_answer = question.correct_answer().to_owned();

        if was_correct {
            self.score += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
            if self.streak == BONUS_STREAK && self.lives < MAX_LIVES {
                self.bonus_pending = true;
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
            self.streak = 0;
        }

        self.answered += 1;
        self.phase = QuizPhase::ShowingResult { index, was_correct };

        Ok(AnswerOutcome {
            word_id,
            was_correct,
            correct_answer,
            score: self.score,
            lives: self.lives,
            streak: self.streak,
            bonus_life_pending: self.bonus_pending,
            ends_session: self.ends_after(index),
        })
    }

    /// Reveal the hint for the current question, spending one hint.
    ///
    /// Choice questions carry no hint and never cost one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless presenting, `QuizError::HintAlreadyShown`
    /// on a second request for the same question, `QuizError::NoHintForQuestion` for a
    /// choice question, or `QuizError::NoHintsRemaining` when out of hints.
    pub fn use_hint(&mut self) -> Result<Hint, QuizError> {
        let QuizPhase::Presenting { index } = self.phase else {
            return Err(self.invalid("use a hint"));
        };
        if self.hint_visible {
            return Err(QuizError::HintAlreadyShown);
        }
        let hint = self
            .questions
            .get(index)
            .and_then(Question::hint)
            .ok_or(QuizError::NoHintForQuestion)?;
        if self.hints_remaining == 0 {
            return Err(QuizError::NoHintsRemaining);
        }

        self.hints_remaining -= 1;
        self.hint_visible = true;
        Ok(hint)
    }

    /// Land a pending bonus life. Returns whether a life was added.
    ///
    /// No-op once the session is finished or when nothing is pending.
    pub fn grant_bonus_life(&mut self) -> bool {
        if !self.bonus_pending || self.is_finished() {
            return false;
        }
        self.bonus_pending = false;
        if self.lives >= MAX_LIVES {
            return false;
        }
        self.lives += 1;
        true
    }

    /// Leave `ShowingResult`, either to the next question or to `Completed`.
    ///
    /// Any bonus life still pending lands first. `now` is used to compute the
    /// time spent when the session completes.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless a result is showing.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, QuizError> {
        let QuizPhase::ShowingResult { index, .. } = self.phase else {
            return Err(self.invalid("advance"));
        };
        self.grant_bonus_life();

        if self.ends_after(index) {
            let elapsed = (now - self.started_at).num_seconds().max(0);
            let report = SessionReport::new(
                self.score,
                u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
                self.score,
                self.max_streak,
                u64::try_from(elapsed).unwrap_or(0),
            )?;
            self.phase = QuizPhase::Completed(report);
            return Ok(Advance::Completed(report));
        }

        let next = index + 1;
        self.current = next;
        self.hint_visible = false;
        self.phase = QuizPhase::Presenting { index: next };
        Ok(Advance::Next { index: next })
    }

    /// Tear the session down without a report. Pending bonus lives are dropped.
    ///
    /// Returns `false` if the session had already finished.
    pub fn abandon(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.bonus_pending = false;
        self.phase = QuizPhase::Abandoned;
        true
    }

    fn ends_after(&self, index: usize) -> bool {
        self.lives == 0 || index + 1 >= self.questions.len()
    }

    fn invalid(&self, operation: &'static str) -> QuizError {
        QuizError::InvalidState {
            operation,
            phase: self.phase.name(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("lives", &self.lives)
            .field("streak", &self.streak)
            .field("max_streak", &self.max_streak)
            .field("hints_remaining", &self.hints_remaining)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
