//! JSON backup of the whole database.
//! Provides export to a file and a restore that replaces every stored record.

use crate::database::db;
use crate::error::{AppError, Result};
use crate::models::{Note, ReadingHistory, ReviewRecord, ReviewableFile, UserSettings};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: i64,
    pub files: Vec<ReviewableFile>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub review_records: Vec<ReviewRecord>,
    #[serde(default)]
    pub reading_history: Vec<ReadingHistory>,
    #[serde(default)]
    pub settings: Option<UserSettings>,
}

/// Snapshot of everything currently stored.
pub fn collect_backup(now: i64, conn: &Connection) -> Result<Backup> {
    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at: now,
        files: db::get_all_files(conn)?,
        notes: db::get_all_notes(conn)?,
        review_records: db::get_all_review_records(conn)?,
        reading_history: db::get_all_reading_history(conn)?,
        settings: Some(db::load_settings(conn)?),
    })
}

/// Writes a pretty-printed backup to `path`.
pub fn export_backup_to_path(path: &Path, now: i64, conn: &Connection) -> Result<Backup> {
    let backup = collect_backup(now, conn)?;
    let json_string = serde_json::to_string_pretty(&backup)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;

    log::info!(
        "Exported {} files to '{}'",
        backup.files.len(),
        path.display()
    );
    Ok(backup)
}

/// Reads and validates a backup file without touching the database.
pub fn read_backup(path: &Path) -> Result<Backup> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let backup: Backup = serde_json::from_str(&contents)?;
    if backup.version == 0 || backup.version > BACKUP_VERSION {
        return Err(AppError::InvalidBackup(format!(
            "unsupported backup version {}",
            backup.version
        )));
    }
    Ok(backup)
}

/// Replaces all files, notes, review records and reading history with the backup's.
///
/// Notes, records and history rows pointing at a file missing from the backup are skipped.
/// Runs in one transaction; on error nothing is changed. Returns the number of files restored.
pub fn restore_backup(backup: &Backup, conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let file_ids: HashSet<&str> = backup.files.iter().map(|f| f.id.as_str()).collect();
    let mut skipped = 0;

    db::clear_records(&tx)?;
    for file in &backup.files {
        db::put_file(file, &tx)?;
    }
    for note in &backup.notes {
        if file_ids.contains(note.file_id.as_str()) {
            db::put_note(note, &tx)?;
        } else {
            skipped += 1;
        }
    }
    for record in &backup.review_records {
        if file_ids.contains(record.file_id.as_str()) {
            db::put_review_record(record, &tx)?;
        } else {
            skipped += 1;
        }
    }
    for entry in &backup.reading_history {
        if file_ids.contains(entry.file_id.as_str()) {
            db::put_reading_history(entry, &tx)?;
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} backup rows that reference missing files", skipped);
    }
    if let Some(settings) = &backup.settings {
        db::save_settings(settings, &tx)?;
    }

    tx.commit()?;
    log::info!("Restored {} files from backup", backup.files.len());
    Ok(backup.files.len())
}
