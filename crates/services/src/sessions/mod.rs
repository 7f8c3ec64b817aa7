mod cancel;
mod plan;
mod workflow;

// Public API of the quiz loop.
pub use crate::error::SessionError;
pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use plan::QuizPlan;
pub use workflow::{QuizLoopService, QuizOutcome, ResultStep};
