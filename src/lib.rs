pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod time;

pub use error::{AppError, Result};
pub use models::{IntervalTable, ReviewOutcome, ReviewSession, ReviewableFile, UserSettings};
