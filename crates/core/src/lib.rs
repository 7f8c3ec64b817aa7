#![forbid(unsafe_code)]

pub mod generator;
pub mod grading;
pub mod model;
pub mod quiz;
pub mod sound;
pub mod time;

pub use time::Clock;
