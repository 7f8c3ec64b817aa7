use std::time::Duration;

use quiz_core::generator::KindPolicy;
use quiz_core::quiz::DEFAULT_HINTS;

/// Tunables for one quiz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    question_count: usize,
    dwell: Duration,
    bonus_delay: Duration,
    hints: u32,
    kind_policy: KindPolicy,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            dwell: Duration::from_millis(1500),
            bonus_delay: Duration::from_millis(500),
            hints: DEFAULT_HINTS,
            kind_policy: KindPolicy::AllKinds,
        }
    }
}

impl QuizConfig {
    /// Questions per quiz. Clamped to at least one.
    #[must_use]
    pub fn with_question_count(mut self, question_count: usize) -> Self {
        self.question_count = question_count.max(1);
        self
    }

    /// How long an answer's result stays on screen.
    #[must_use]
    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    /// Delay before a pending bonus life lands. Never longer than the dwell.
    #[must_use]
    pub fn with_bonus_delay(mut self, bonus_delay: Duration) -> Self {
        self.bonus_delay = bonus_delay;
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: u32) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn with_kind_policy(mut self, kind_policy: KindPolicy) -> Self {
        self.kind_policy = kind_policy;
        self
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    #[must_use]
    pub fn bonus_delay(&self) -> Duration {
        self.bonus_delay.min(self.dwell)
    }

    #[must_use]
    pub fn hints(&self) -> u32 {
        self.hints
    }

    #[must_use]
    pub fn kind_policy(&self) -> KindPolicy {
        self.kind_policy
    }
}
