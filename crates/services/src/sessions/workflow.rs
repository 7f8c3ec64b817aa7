use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use quiz_core::generator::QuestionGenerator;
use quiz_core::grading::{Grade, grade_report};
use quiz_core::model::{Hint, SessionReport};
use quiz_core::quiz::{Advance, AnswerOutcome, QuizError, QuizPhase, QuizSession};
use quiz_core::sound::{SoundCue, SoundPlayer};
use storage::repository::Storage;

use super::cancel::CancelToken;
use super::plan::QuizPlan;
use crate::Clock;
use crate::config::QuizConfig;
use crate::error::SessionError;

/// What happened while a result was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStep {
    /// The dwell elapsed and the session moved on.
    Advanced(Advance),
    /// The wait was cancelled; the session is still showing the result.
    Cancelled,
}

/// A graded, persisted end of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub report: SessionReport,
    pub grade: Grade,
    pub high_score: u32,
    pub is_new_high_score: bool,
}

/// Drives a `QuizSession` against storage, sound and the result timers.
///
/// The session stays with the caller; every method borrows it for the length
/// of one step, so a dropped future can never touch it afterwards.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    config: QuizConfig,
    storage: Storage,
    sounds: Arc<dyn SoundPlayer>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage, sounds: Arc<dyn SoundPlayer>) -> Self {
        Self {
            clock,
            config: QuizConfig::default(),
            storage,
            sounds,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Sample words and start a new session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store is empty, distractors run short or
    /// storage fails.
    pub async fn start_quiz<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<QuizSession, SessionError> {
        let generator = QuestionGenerator::new(self.config.kind_policy());
        let plan =
            QuizPlan::build(&self.storage, generator, self.config.question_count(), rng).await?;
        let session =
            QuizSession::new(plan.questions, self.clock.now())?.with_hints(self.config.hints());
        tracing::info!(questions = session.total_questions(), "quiz started");
        Ok(session)
    }

    /// Score an answer and persist it before the session moves to its result.
    ///
    /// If persisting fails the session is left presenting the same question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if no question is being presented, or
    /// `SessionError::Storage` if the answer cannot be recorded.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        candidate: &str,
    ) -> Result<AnswerOutcome, SessionError> {
        let mut next = session.clone();
        let outcome = next.submit_answer(candidate)?;
        self.storage
            .record_answer(outcome.word_id, outcome.was_correct)
            .await?;
        *session = next;

        self.sounds.play(if outcome.was_correct {
            SoundCue::Success
        } else {
            SoundCue::Wrong
        });
        Ok(outcome)
    }

    /// Reveal the current question's hint.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the question has no hint, hints are used
    /// up or already shown, or no question is being presented.
    pub fn use_hint(&self, session: &mut QuizSession) -> Result<Hint, SessionError> {
        let hint = session.use_hint()?;
        tracing::debug!(hints_left = session.hints_remaining(), "hint revealed");
        Ok(hint)
    }

    /// Hold the result on screen, land any pending bonus life, then advance.
    ///
    /// The bonus life lands after the bonus delay; the session advances once the
    /// full dwell has elapsed. Cancelling `cancel` stops the wait with the session
    /// still showing its result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` unless a result is showing.
    pub async fn await_result(
        &self,
        session: &mut QuizSession,
        cancel: &CancelToken,
    ) -> Result<ResultStep, SessionError> {
        let phase = session.phase();
        if !matches!(phase, QuizPhase::ShowingResult { .. }) {
            return Err(QuizError::InvalidState {
                operation: "await the result",
                phase: phase.name(),
            }
            .into());
        }

        let dwell = self.config.dwell();
        let mut waited = Duration::ZERO;
        if session.bonus_life_pending() {
            let delay = self.config.bonus_delay();
            if !wait(delay, cancel).await {
                return Ok(ResultStep::Cancelled);
            }
            waited = delay;
            if session.grant_bonus_life() {
                tracing::debug!(lives = session.lives(), "bonus life granted");
                self.sounds.play(SoundCue::Bonus);
            }
        }

        if !wait(dwell.saturating_sub(waited), cancel).await {
            return Ok(ResultStep::Cancelled);
        }

        let step = session.advance(self.clock.now())?;
        if let Advance::Completed(report) = step {
            tracing::info!(
                score = report.score(),
                total = report.total_questions(),
                max_streak = report.max_streak(),
                "quiz completed"
            );
        }
        Ok(ResultStep::Advanced(step))
    }

    /// Abandon the session. Returns `false` if it had already finished.
    pub fn abandon(&self, session: &mut QuizSession) -> bool {
        let abandoned = session.abandon();
        if abandoned {
            tracing::info!(answered = session.progress().answered, "quiz abandoned");
        }
        abandoned
    }

    /// Grade a completed session and update the high score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` unless the session completed, or
    /// `SessionError::Storage` if the high score cannot be read or written.
    pub async fn finish(&self, session: &QuizSession) -> Result<QuizOutcome, SessionError> {
        let report = session.report().ok_or(SessionError::NotFinished)?;
        let grade = grade_report(&report)?;
        let is_new_high_score = self
            .storage
            .set_high_score_if_greater(report.score())
            .await?;
        let high_score = self.storage.high_score().await?;

        Ok(QuizOutcome {
            report,
            grade,
            high_score,
            is_new_high_score,
        })
    }
}

/// Sleep for `duration` unless cancelled first. Returns whether the sleep finished.
async fn wait(duration: Duration, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        () = cancel.cancelled() => false,
    }
}
