//! Reading sessions and the "recently read" summary built from them.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistory {
    pub id: i64,
    pub file_id: String,
    pub read_at: i64,
    /// Seconds spent in the reader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_duration: Option<i64>,
    /// 0..100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_progress: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecentReading {
    pub file_id: String,
    pub file_name: String,
    pub last_read_at: i64,
    pub read_count: usize,
}
