//! A markdown file tracked for review. The file id is derived from its path.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableFile {
    pub id: String,
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: i64,
    pub modified_at: i64,
    pub created_at: i64,
    pub review_level: u32,
    pub last_reviewed_at: i64,
    pub next_review_at: i64,
    pub reading_progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_position: Option<f64>,
}

impl ReviewableFile {
    /// A freshly imported file at level 0 that has never been reviewed.
    pub fn new(path: &str, name: &str, content: String, size: i64, modified_at: i64, now: i64) -> Self {
        Self {
            id: generate_file_id(path),
            path: path.to_string(),
            name: name.to_string(),
            content,
            size,
            modified_at,
            created_at: now,
            review_level: 0,
            last_reviewed_at: 0,
            next_review_at: 0,
            reading_progress: 0.0,
            scroll_position: None,
        }
    }

    pub fn is_learned(&self) -> bool {
        self.last_reviewed_at > 0
    }
}

/// Stable id for a path: 31-multiplier hash over UTF-16 units, wrapped to i32.
pub fn generate_file_id(path: &str) -> String {
    let hash = path
        .encode_utf16()
        .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(unit as i32));
    format!("file_{}", hash.unsigned_abs())
}
