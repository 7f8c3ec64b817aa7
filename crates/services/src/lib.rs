#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod corpus;
pub mod error;
pub mod offline;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::{QuizServices, StatsSnapshot, WordStats};
pub use config::QuizConfig;
pub use error::{AppServicesError, CorpusError, OfflineError, SessionError};
pub use sessions::{
    CancelHandle, CancelToken, QuizLoopService, QuizOutcome, QuizPlan, ResultStep, cancel_pair,
};
