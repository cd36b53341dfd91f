//! Process-level configuration read from the environment.
use std::env;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "REVIEW_READER_DB";
pub const DEFAULT_DB_PATH: &str = "db.sqlite3";

/// Database location: `$REVIEW_READER_DB` if set and non-empty, otherwise `db.sqlite3`.
pub fn database_path() -> PathBuf {
    database_path_from(env::var(DB_PATH_ENV).ok())
}

fn database_path_from(value: Option<String>) -> PathBuf {
    match value {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DB_PATH),
    }
}
