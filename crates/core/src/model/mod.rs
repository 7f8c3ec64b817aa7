mod ids;
mod progress;
mod question;
mod report;
mod word;

pub use ids::WordId;

pub use progress::Progress;
pub use question::{Hint, Question, QuestionKind};
pub use report::{ReportError, SessionReport};
pub use word::{Word, WordDraft, WordError};
