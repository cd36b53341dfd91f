//! Import of a directory of markdown notes.

use crate::database::db;
use crate::error::Result;
use crate::models::ReviewableFile;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// A markdown file read from disk, not yet stored.
#[derive(Clone, Debug)]
pub struct ScannedFile {
    /// Relative to the parent of the imported root, `/` separated.
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: i64,
    pub modified_at: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}

/// Collects every markdown file under `root`, skipping hidden files and folders.
///
/// Paths start with the root directory's own name, e.g. `notes/rust/ownership.md`.
pub fn scan_directory(root: &Path) -> Result<Vec<ScannedFile>> {
    let base = root.parent().unwrap_or(root);
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_hidden(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let relative = path.strip_prefix(base).unwrap_or(path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        files.push(ScannedFile {
            path: relative,
            name: entry.file_name().to_string_lossy().to_string(),
            content,
            size: metadata.len() as i64,
            modified_at,
        });
    }

    Ok(files)
}

/// Scans `root` and stores every markdown file, keeping review state of known files.
pub fn import_directory(root: &Path, now: i64, conn: &Connection) -> Result<ImportSummary> {
    let scanned = scan_directory(root)?;
    let tx = conn.unchecked_transaction()?;

    let mut summary = ImportSummary::default();
    for file in scanned {
        let record = ReviewableFile::new(
            &file.path,
            &file.name,
            file.content,
            file.size,
            file.modified_at,
            now,
        );
        if db::upsert_file(&record, &tx)? {
            summary.added += 1;
        } else {
            summary.updated += 1;
        }
    }
    tx.commit()?;

    log::info!(
        "Imported {}: {} added, {} updated",
        root.display(),
        summary.added,
        summary.updated
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReviewOutcome, generate_file_id};

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn notes_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("notes");
        write(&root, "intro.md", "# Intro");
        write(&root, "rust/ownership.MD", "# Ownership");
        write(&root, "rust/readme.txt", "not markdown");
        write(&root, ".obsidian/config.md", "hidden");
        write(&root, "rust/.draft.md", "hidden");
        dir
    }

    #[test]
    fn test_scan_collects_markdown_only() {
        let dir = notes_dir();
        let files = scan_directory(&dir.path().join("notes")).unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["notes/intro.md", "notes/rust/ownership.MD"]);
        assert_eq!(files[0].name, "intro.md");
        assert_eq!(files[0].content, "# Intro");
        assert_eq!(files[0].size, 7);
    }

    #[test]
    fn test_unreadable_file_does_not_abort_scan() {
        let dir = notes_dir();
        let root = dir.path().join("notes");
        fs::write(root.join("binary.md"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let summary = import_directory(&root, 1_000, &conn).unwrap();

        assert_eq!(summary, ImportSummary { added: 2, updated: 0 });
        assert!(db::get_file(&generate_file_id("notes/binary.md"), &conn).is_err());
    }

    #[test]
    fn test_reimport_keeps_review_state() {
        let dir = notes_dir();
        let root = dir.path().join("notes");
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let first = import_directory(&root, 1_000, &conn).unwrap();
        assert_eq!(first, ImportSummary { added: 2, updated: 0 });

        let id = generate_file_id("notes/intro.md");
        db::mark_as_learned(&id, 2_000, &conn).unwrap();
        db::submit_review(&id, ReviewOutcome::Remembered, 3_000, &conn).unwrap();

        write(&root, "intro.md", "# Intro, revised");
        write(&root, "new.md", "# New");
        let second = import_directory(&root, 4_000, &conn).unwrap();
        assert_eq!(second, ImportSummary { added: 1, updated: 2 });

        let file = db::get_file(&id, &conn).unwrap();
        assert_eq!(file.content, "# Intro, revised");
        assert_eq!(file.review_level, 2);
        assert_eq!(file.created_at, 1_000);
        assert_eq!(db::get_all_files(&conn).unwrap().len(), 3);
    }
}
