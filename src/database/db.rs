//! Database operations for the review reader
//!
//! Handles SQLite initialization and every read/write the app performs on files,
//! review records, notes, reading history and user settings.

use crate::error::{AppError, Result};
use crate::models::{
    IntervalTable, Note, ReadingHistory, RecentReading, ReviewOutcome, ReviewRecord, ReviewStats,
    ReviewTask, ReviewableFile, ScheduledReview, UserSettings,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;

const SETTINGS_KEY: &str = "user";
const FILE_COLUMNS: &str = "id, path, name, content, size, modified_at, created_at, review_level,
     last_reviewed_at, next_review_at, reading_progress, scroll_position";

/// Opens (or creates) the database at `path` and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    log::info!("Opened database at {}", path.display());
    Ok(conn)
}

/// Creates all tables and seeds default settings. Safe to call repeatedly.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Files imported from a notes directory, keyed by a hash of their path
    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            modified_at INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT 0,
            review_level INTEGER NOT NULL DEFAULT 0,
            last_reviewed_at INTEGER NOT NULL DEFAULT 0,
            next_review_at INTEGER NOT NULL DEFAULT 0,
            reading_progress REAL NOT NULL DEFAULT 0,
            scroll_position REAL
        )",
        (),
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_files_next_review ON files(next_review_at)",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL,
            reviewed_at INTEGER NOT NULL,
            outcome TEXT NOT NULL CHECK (outcome IN ('remembered', 'forgotten')),
            review_level INTEGER NOT NULL,
            FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reading_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL,
            read_at INTEGER NOT NULL,
            reading_duration INTEGER,
            reading_progress REAL,
            FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
        )",
        (),
    )?;

    // Key/value store; user settings live under 'user' as JSON
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    let defaults = serde_json::to_string(&UserSettings::default())?;
    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
        params![SETTINGS_KEY, defaults],
    )?;

    Ok(())
}

fn file_from_row(row: &Row) -> rusqlite::Result<ReviewableFile> {
    Ok(ReviewableFile {
        id: row.get(0)?,
        path: row.get(1)?,
        name: row.get(2)?,
        content: row.get(3)?,
        size: row.get(4)?,
        modified_at: row.get(5)?,
        created_at: row.get(6)?,
        review_level: row.get(7)?,
        last_reviewed_at: row.get(8)?,
        next_review_at: row.get(9)?,
        reading_progress: row.get(10)?,
        scroll_position: row.get(11)?,
    })
}

fn outcome_from_sql(idx: usize, raw: String) -> rusqlite::Result<ReviewOutcome> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

fn review_record_from_row(row: &Row) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        reviewed_at: row.get(2)?,
        outcome: outcome_from_sql(3, row.get(3)?)?,
        review_level: row.get(4)?,
    })
}

fn note_from_row(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        file_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn reading_from_row(row: &Row) -> rusqlite::Result<ReadingHistory> {
    Ok(ReadingHistory {
        id: row.get(0)?,
        file_id: row.get(1)?,
        read_at: row.get(2)?,
        reading_duration: row.get(3)?,
        reading_progress: row.get(4)?,
    })
}

// ===== Files =====

/// Inserts a new file or refreshes content of an existing one.
///
/// Review state, reading progress and creation time of an existing file are kept.
/// Returns true when the file was newly inserted.
pub fn upsert_file(file: &ReviewableFile, conn: &Connection) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE files SET path = ?1, name = ?2, content = ?3, size = ?4, modified_at = ?5
         WHERE id = ?6",
        params![
            file.path,
            file.name,
            file.content,
            file.size,
            file.modified_at,
            file.id
        ],
    )?;
    if updated > 0 {
        return Ok(false);
    }

    put_file(file, conn)?;
    log::debug!("Added file '{}' as {}", file.path, file.id);
    Ok(true)
}

/// Writes every column of `file`, replacing any row with the same id.
pub fn put_file(file: &ReviewableFile, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO files (id, path, name, content, size, modified_at, created_at,
            review_level, last_reviewed_at, next_review_at, reading_progress, scroll_position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            file.id,
            file.path,
            file.name,
            file.content,
            file.size,
            file.modified_at,
            file.created_at,
            file.review_level,
            file.last_reviewed_at,
            file.next_review_at,
            file.reading_progress,
            file.scroll_position
        ],
    )?;
    Ok(())
}

pub fn get_file(file_id: &str, conn: &Connection) -> Result<ReviewableFile> {
    conn.query_row(
        &format!("SELECT {} FROM files WHERE id = ?1", FILE_COLUMNS),
        params![file_id],
        file_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::FileNotFound(file_id.to_string()))
}

/// All files ordered by path.
pub fn get_all_files(conn: &Connection) -> Result<Vec<ReviewableFile>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM files ORDER BY path", FILE_COLUMNS))?;
    let files = stmt
        .query_map([], file_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(files)
}

/// Case-insensitive match on name, path or content. A blank query returns every file.
pub fn search_files(query: &str, conn: &Connection) -> Result<Vec<ReviewableFile>> {
    let files = get_all_files(conn)?;
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Ok(files);
    }

    Ok(files
        .into_iter()
        .filter(|f| {
            f.name.to_lowercase().contains(&query)
                || f.path.to_lowercase().contains(&query)
                || f.content.to_lowercase().contains(&query)
        })
        .collect())
}

/// Removes a file together with its notes, review records and reading history.
pub fn delete_file(file_id: &str, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM files WHERE id = ?1", params![file_id])?;
    if deleted == 0 {
        return Err(AppError::FileNotFound(file_id.to_string()));
    }
    log::info!("Deleted file {}", file_id);
    Ok(())
}

/// Stores reading progress (clamped to 0..=100). A `None` scroll position keeps the stored one.
pub fn update_reading_progress(
    file_id: &str,
    reading_progress: f64,
    scroll_position: Option<f64>,
    conn: &Connection,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE files SET reading_progress = ?1, scroll_position = COALESCE(?2, scroll_position)
         WHERE id = ?3",
        params![reading_progress.clamp(0.0, 100.0), scroll_position, file_id],
    )?;
    if updated == 0 {
        return Err(AppError::FileNotFound(file_id.to_string()));
    }
    Ok(())
}

// ===== Review scheduling =====

fn store_schedule(
    file_id: &str,
    scheduled: &ScheduledReview,
    now: i64,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "UPDATE files SET review_level = ?1, last_reviewed_at = ?2, next_review_at = ?3
         WHERE id = ?4",
        params![scheduled.level, now, scheduled.next_review_at, file_id],
    )?;
    Ok(())
}

/// Marks a file as read for the first time: it joins the ladder at level 1.
pub fn mark_as_learned(file_id: &str, now: i64, conn: &Connection) -> Result<ScheduledReview> {
    get_file(file_id, conn)?;
    let intervals = load_settings(conn)?.review_intervals;

    let scheduled = intervals.schedule(0, ReviewOutcome::Remembered, Some(now));
    store_schedule(file_id, &scheduled, now, conn)?;

    log::info!("File {} learned, next review at {}", file_id, scheduled.next_review_at);
    Ok(scheduled)
}

/// Applies a review outcome to a file and appends it to the review history.
///
/// The stored level and due time both come from a single `schedule` call,
/// so they can't disagree.
pub fn submit_review(
    file_id: &str,
    outcome: ReviewOutcome,
    now: i64,
    conn: &Connection,
) -> Result<ScheduledReview> {
    let intervals = load_settings(conn)?.review_intervals;
    submit_review_with(file_id, outcome, now, &intervals, conn)
}

fn submit_review_with(
    file_id: &str,
    outcome: ReviewOutcome,
    now: i64,
    intervals: &IntervalTable,
    conn: &Connection,
) -> Result<ScheduledReview> {
    let tx = conn.unchecked_transaction()?;

    let file = get_file(file_id, &tx)?;
    let scheduled = intervals.schedule(file.review_level, outcome, Some(now));
    store_schedule(file_id, &scheduled, now, &tx)?;

    tx.execute(
        "INSERT INTO review_records (file_id, reviewed_at, outcome, review_level)
         VALUES (?1, ?2, ?3, ?4)",
        params![file_id, now, outcome.as_str(), file.review_level],
    )?;
    tx.commit()?;

    log::info!(
        "Review of {}: {} (level {} -> {})",
        file_id,
        outcome,
        file.review_level,
        scheduled.level
    );
    Ok(scheduled)
}

/// Files to review today: due before `day_end` and reviewed at least once.
///
/// Files due before `day_start` are flagged overdue. Sorted by due time.
pub fn get_today_review_tasks(
    day_start: i64,
    day_end: i64,
    conn: &Connection,
) -> Result<Vec<ReviewTask>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, last_reviewed_at, next_review_at, review_level
         FROM files
         WHERE next_review_at <= ?1 AND last_reviewed_at > 0
         ORDER BY next_review_at ASC, path ASC",
    )?;

    let tasks = stmt
        .query_map(params![day_end], |row| {
            let next_review_at: i64 = row.get(3)?;
            Ok(ReviewTask {
                file_id: row.get(0)?,
                file_name: row.get(1)?,
                last_reviewed_at: row.get(2)?,
                next_review_at,
                review_level: row.get(4)?,
                overdue: next_review_at < day_start,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(tasks)
}

/// Review records, newest first, optionally for one file only.
pub fn get_review_history(file_id: Option<&str>, conn: &Connection) -> Result<Vec<ReviewRecord>> {
    let records = match file_id {
        Some(id) => {
            let mut stmt = conn.prepare(
                "SELECT id, file_id, reviewed_at, outcome, review_level FROM review_records
                 WHERE file_id = ?1 ORDER BY reviewed_at DESC, id DESC",
            )?;
            stmt.query_map(params![id], review_record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, file_id, reviewed_at, outcome, review_level FROM review_records
                 ORDER BY reviewed_at DESC, id DESC",
            )?;
            stmt.query_map([], review_record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(records)
}

/// Percent of reviews answered "remembered", 100 when nothing was reviewed yet.
pub fn get_memory_retention_rate(conn: &Connection) -> Result<u8> {
    let (total, remembered): (i64, Option<i64>) = conn.query_row(
        "SELECT COUNT(*), SUM(outcome = 'remembered') FROM review_records",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if total == 0 {
        return Ok(100);
    }
    let remembered = remembered.unwrap_or(0) as f64;
    Ok((remembered / total as f64 * 100.0).round() as u8)
}

pub fn get_review_stats(conn: &Connection) -> Result<ReviewStats> {
    let (total_files, learned_files): (i64, Option<i64>) = conn.query_row(
        "SELECT COUNT(*), SUM(review_level > 0) FROM files",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let total_reviews: i64 =
        conn.query_row("SELECT COUNT(*) FROM review_records", [], |row| row.get(0))?;

    Ok(ReviewStats {
        total_files: total_files as usize,
        learned_files: learned_files.unwrap_or(0) as usize,
        total_reviews: total_reviews as usize,
        retention_rate: get_memory_retention_rate(conn)?,
    })
}

pub fn get_all_review_records(conn: &Connection) -> Result<Vec<ReviewRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, reviewed_at, outcome, review_level FROM review_records ORDER BY id",
    )?;
    let records = stmt
        .query_map([], review_record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

pub fn put_review_record(record: &ReviewRecord, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO review_records (id, file_id, reviewed_at, outcome, review_level)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.file_id,
            record.reviewed_at,
            record.outcome.as_str(),
            record.review_level
        ],
    )?;
    Ok(())
}

// ===== Notes =====

pub fn create_note(file_id: &str, content: &str, now: i64, conn: &Connection) -> Result<Note> {
    get_file(file_id, conn)?;
    conn.execute(
        "INSERT INTO notes (file_id, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![file_id, content, now],
    )?;

    Ok(Note {
        id: conn.last_insert_rowid(),
        file_id: file_id.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn update_note(note_id: i64, content: &str, now: i64, conn: &Connection) -> Result<()> {
    let updated = conn.execute(
        "UPDATE notes SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![content, now, note_id],
    )?;
    if updated == 0 {
        return Err(AppError::NoteNotFound(note_id));
    }
    Ok(())
}

pub fn delete_note(note_id: i64, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM notes WHERE id = ?1", params![note_id])?;
    if deleted == 0 {
        return Err(AppError::NoteNotFound(note_id));
    }
    Ok(())
}

/// Notes attached to a file, newest first.
pub fn get_notes_by_file(file_id: &str, conn: &Connection) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, content, created_at, updated_at FROM notes
         WHERE file_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let notes = stmt
        .query_map(params![file_id], note_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(notes)
}

/// Every note, newest first.
pub fn get_all_notes(conn: &Connection) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, content, created_at, updated_at FROM notes
         ORDER BY created_at DESC, id DESC",
    )?;
    let notes = stmt
        .query_map([], note_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(notes)
}

pub fn put_note(note: &Note, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO notes (id, file_id, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![note.id, note.file_id, note.content, note.created_at, note.updated_at],
    )?;
    Ok(())
}

// ===== Reading history =====

pub fn record_reading_history(
    file_id: &str,
    reading_duration: Option<i64>,
    reading_progress: Option<f64>,
    now: i64,
    conn: &Connection,
) -> Result<ReadingHistory> {
    conn.execute(
        "INSERT INTO reading_history (file_id, read_at, reading_duration, reading_progress)
         VALUES (?1, ?2, ?3, ?4)",
        params![file_id, now, reading_duration, reading_progress],
    )?;

    Ok(ReadingHistory {
        id: conn.last_insert_rowid(),
        file_id: file_id.to_string(),
        read_at: now,
        reading_duration,
        reading_progress,
    })
}

/// Most recently read files, one entry per file, newest first.
pub fn get_recent_reading_files(limit: usize, conn: &Connection) -> Result<Vec<RecentReading>> {
    let mut stmt = conn.prepare(
        "SELECT h.file_id, h.read_at, f.name
         FROM reading_history h
         LEFT JOIN files f ON f.id = h.file_id
         ORDER BY h.read_at DESC, h.id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut read_counts: HashMap<&str, usize> = HashMap::new();
    for (file_id, _, _) in &rows {
        *read_counts.entry(file_id.as_str()).or_insert(0) += 1;
    }

    // Rows are newest first, so the first row seen per file is its latest read
    let mut recent: Vec<RecentReading> = Vec::new();
    for (file_id, read_at, name) in &rows {
        if recent.len() >= limit {
            break;
        }
        if recent.iter().any(|r| &r.file_id == file_id) {
            continue;
        }
        recent.push(RecentReading {
            file_id: file_id.clone(),
            file_name: name.clone().unwrap_or_else(|| "Unknown file".to_string()),
            last_read_at: *read_at,
            read_count: read_counts.get(file_id.as_str()).copied().unwrap_or(1),
        });
    }

    Ok(recent)
}

/// Reading sessions of one file in the order they happened.
pub fn get_file_reading_history(file_id: &str, conn: &Connection) -> Result<Vec<ReadingHistory>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, read_at, reading_duration, reading_progress FROM reading_history
         WHERE file_id = ?1 ORDER BY read_at ASC, id ASC",
    )?;
    let history = stmt
        .query_map(params![file_id], reading_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(history)
}

pub fn get_all_reading_history(conn: &Connection) -> Result<Vec<ReadingHistory>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, read_at, reading_duration, reading_progress FROM reading_history
         ORDER BY id",
    )?;
    let history = stmt
        .query_map([], reading_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(history)
}

pub fn put_reading_history(entry: &ReadingHistory, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO reading_history
            (id, file_id, read_at, reading_duration, reading_progress)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id,
            entry.file_id,
            entry.read_at,
            entry.reading_duration,
            entry.reading_progress
        ],
    )?;
    Ok(())
}

/// Deletes every file and everything attached to it. Settings are kept.
pub fn clear_records(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM reading_history", ())?;
    conn.execute("DELETE FROM review_records", ())?;
    conn.execute("DELETE FROM notes", ())?;
    conn.execute("DELETE FROM files", ())?;
    Ok(())
}

// ===== Settings =====

pub fn load_settings(conn: &Connection) -> Result<UserSettings> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![SETTINGS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(UserSettings::default()),
    }
}

pub fn save_settings(settings: &UserSettings, conn: &Connection) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![SETTINGS_KEY, json],
    )?;
    log::debug!("Saved settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{DAY_MS, MINUTE_MS};

    const T: i64 = 1_700_000_000_000;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn add_file(path: &str, conn: &Connection) -> String {
        let name = path.rsplit('/').next().unwrap();
        let file = ReviewableFile::new(path, name, format!("# {}", name), 10, T, T);
        upsert_file(&file, conn).unwrap();
        file.id
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = test_conn();
        init_schema(&conn).unwrap();
        assert_eq!(load_settings(&conn).unwrap(), UserSettings::default());
    }

    #[test]
    fn test_upsert_keeps_review_state() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        submit_review(&id, ReviewOutcome::Remembered, T, &conn).unwrap();

        let changed =
            ReviewableFile::new("notes/a.md", "a.md", "# new".to_string(), 5, T + 1, T + 1);
        let inserted = upsert_file(&changed, &conn).unwrap();
        assert!(!inserted);

        let stored = get_file(&id, &conn).unwrap();
        assert_eq!(stored.content, "# new");
        assert_eq!(stored.review_level, 1);
        assert_eq!(stored.created_at, T);
    }

    #[test]
    fn test_get_missing_file() {
        let conn = test_conn();
        assert!(matches!(
            get_file("file_404", &conn),
            Err(AppError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_submit_remembered_advances() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        conn.execute(
            "UPDATE files SET review_level = 2, last_reviewed_at = ?1 WHERE id = ?2",
            params![T - DAY_MS, id],
        )
        .unwrap();

        let scheduled = submit_review(&id, ReviewOutcome::Remembered, T, &conn).unwrap();
        assert_eq!(scheduled.level, 3);

        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.review_level, 3);
        assert_eq!(file.last_reviewed_at, T);
        assert_eq!(file.next_review_at, T + 1440 * MINUTE_MS);

        let history = get_review_history(Some(&id), &conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].review_level, 2);
        assert_eq!(history[0].outcome, ReviewOutcome::Remembered);
    }

    #[test]
    fn test_submit_forgotten_resets() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        conn.execute("UPDATE files SET review_level = 5 WHERE id = ?1", params![id])
            .unwrap();

        submit_review(&id, ReviewOutcome::Forgotten, T, &conn).unwrap();
        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.review_level, 0);
        assert_eq!(file.next_review_at, T + 5 * MINUTE_MS);
    }

    #[test]
    fn test_level_cap_follows_configured_table() {
        let conn = test_conn();
        let mut settings = load_settings(&conn).unwrap();
        settings.review_intervals = IntervalTable::new(vec![1, 2, 3]).unwrap();
        save_settings(&settings, &conn).unwrap();

        let id = add_file("notes/a.md", &conn);
        for _ in 0..5 {
            submit_review(&id, ReviewOutcome::Remembered, T, &conn).unwrap();
        }
        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.review_level, 2);
        assert_eq!(file.next_review_at, T + 3 * MINUTE_MS);
    }

    #[test]
    fn test_submit_review_missing_file() {
        let conn = test_conn();
        let result = submit_review("file_1", ReviewOutcome::Remembered, T, &conn);
        assert!(matches!(result, Err(AppError::FileNotFound(_))));
        assert!(get_review_history(None, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_mark_as_learned() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        mark_as_learned(&id, T, &conn).unwrap();

        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.review_level, 1);
        assert_eq!(file.last_reviewed_at, T);
        assert_eq!(file.next_review_at, T + 30 * MINUTE_MS);
    }

    #[test]
    fn test_today_review_tasks() {
        let conn = test_conn();
        let day_start = T;
        let day_end = T + DAY_MS - 1;

        let overdue = add_file("notes/overdue.md", &conn);
        let today = add_file("notes/today.md", &conn);
        let tomorrow = add_file("notes/tomorrow.md", &conn);
        add_file("notes/never.md", &conn);

        let set = |id: &str, next: i64| {
            conn.execute(
                "UPDATE files SET review_level = 1, last_reviewed_at = ?1, next_review_at = ?2
                 WHERE id = ?3",
                params![T - 3 * DAY_MS, next, id],
            )
            .unwrap();
        };
        set(&today, T + 3 * 60 * MINUTE_MS);
        set(&overdue, T - DAY_MS);
        set(&tomorrow, T + DAY_MS + MINUTE_MS);

        let tasks = get_today_review_tasks(day_start, day_end, &conn).unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.file_id.as_str()).collect();
        assert_eq!(ids, vec![overdue.as_str(), today.as_str()]);
        assert!(tasks[0].overdue);
        assert!(!tasks[1].overdue);
        assert_eq!(tasks[1].file_name, "today.md");
    }

    #[test]
    fn test_forgotten_level_zero_file_stays_in_tasks() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        submit_review(&id, ReviewOutcome::Forgotten, T - 2 * DAY_MS, &conn).unwrap();

        let tasks = get_today_review_tasks(T, T + DAY_MS - 1, &conn).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].overdue);
        assert_eq!(tasks[0].review_level, 0);
    }

    #[test]
    fn test_retention_rate_and_stats() {
        let conn = test_conn();
        assert_eq!(get_memory_retention_rate(&conn).unwrap(), 100);

        let a = add_file("notes/a.md", &conn);
        add_file("notes/b.md", &conn);
        submit_review(&a, ReviewOutcome::Remembered, T, &conn).unwrap();
        submit_review(&a, ReviewOutcome::Remembered, T + 1, &conn).unwrap();
        submit_review(&a, ReviewOutcome::Forgotten, T + 2, &conn).unwrap();

        assert_eq!(get_memory_retention_rate(&conn).unwrap(), 67);

        let stats = get_review_stats(&conn).unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.learned_files, 0);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.retention_rate, 67);

        let history = get_review_history(None, &conn).unwrap();
        assert_eq!(history[0].outcome, ReviewOutcome::Forgotten);
        assert_eq!(history[0].review_level, 2);
    }

    #[test]
    fn test_search_files() {
        let conn = test_conn();
        add_file("notes/Rust.md", &conn);
        add_file("notes/go.md", &conn);

        assert_eq!(search_files("rust", &conn).unwrap().len(), 1);
        assert_eq!(search_files("NOTES", &conn).unwrap().len(), 2);
        assert_eq!(search_files("# go", &conn).unwrap().len(), 1);
        assert_eq!(search_files("  ", &conn).unwrap().len(), 2);
        assert!(search_files("python", &conn).unwrap().is_empty());
    }

    #[test]
    fn test_notes_crud() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);

        let first = create_note(&id, "first", T, &conn).unwrap();
        let second = create_note(&id, "second", T + 1, &conn).unwrap();

        let notes = get_notes_by_file(&id, &conn).unwrap();
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].id, first.id);

        update_note(first.id, "edited", T + 5, &conn).unwrap();
        let notes = get_notes_by_file(&id, &conn).unwrap();
        assert_eq!(notes[1].content, "edited");
        assert_eq!(notes[1].updated_at, T + 5);
        assert_eq!(notes[1].created_at, T);

        delete_note(second.id, &conn).unwrap();
        assert_eq!(get_all_notes(&conn).unwrap().len(), 1);
        assert!(matches!(
            delete_note(second.id, &conn),
            Err(AppError::NoteNotFound(_))
        ));
        assert!(matches!(
            create_note("file_404", "x", T, &conn),
            Err(AppError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_recent_reading_dedupes() {
        let conn = test_conn();
        let f1 = add_file("notes/File 1.md", &conn);
        let f2 = add_file("notes/File 2.md", &conn);
        let f3 = add_file("notes/File 3.md", &conn);

        record_reading_history(&f3, None, None, T - 4000, &conn).unwrap();
        record_reading_history(&f1, Some(60), Some(20.0), T - 3000, &conn).unwrap();
        record_reading_history(&f2, None, None, T - 2000, &conn).unwrap();
        record_reading_history(&f1, Some(120), Some(50.0), T - 1000, &conn).unwrap();

        let recent = get_recent_reading_files(3, &conn).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].file_id, f1);
        assert_eq!(recent[0].file_name, "File 1.md");
        assert_eq!(recent[0].read_count, 2);
        assert_eq!(recent[0].last_read_at, T - 1000);
        assert_eq!(recent[1].file_id, f2);
        assert_eq!(recent[2].file_id, f3);

        assert_eq!(get_recent_reading_files(1, &conn).unwrap().len(), 1);

        let history = get_file_reading_history(&f1, &conn).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reading_duration, Some(60));
        assert_eq!(history[1].reading_progress, Some(50.0));
    }

    #[test]
    fn test_delete_file_cascades() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        create_note(&id, "n", T, &conn).unwrap();
        submit_review(&id, ReviewOutcome::Remembered, T, &conn).unwrap();
        record_reading_history(&id, None, None, T, &conn).unwrap();

        delete_file(&id, &conn).unwrap();
        assert!(get_all_notes(&conn).unwrap().is_empty());
        assert!(get_review_history(None, &conn).unwrap().is_empty());
        assert!(get_recent_reading_files(3, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_reading_progress_is_clamped() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        update_reading_progress(&id, 140.0, Some(12.5), &conn).unwrap();

        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.reading_progress, 100.0);
        assert_eq!(file.scroll_position, Some(12.5));
    }

    #[test]
    fn test_reading_progress_keeps_scroll_position() {
        let conn = test_conn();
        let id = add_file("notes/a.md", &conn);
        update_reading_progress(&id, 20.0, Some(300.0), &conn).unwrap();
        update_reading_progress(&id, 45.0, None, &conn).unwrap();

        let file = get_file(&id, &conn).unwrap();
        assert_eq!(file.reading_progress, 45.0);
        assert_eq!(file.scroll_position, Some(300.0));
    }
}
