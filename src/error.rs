//! Error type shared by the record layer, importers and backups.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    #[error("Invalid interval table: {0}")]
    InvalidIntervals(String),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, AppError>;
