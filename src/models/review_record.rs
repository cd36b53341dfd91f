//! History entry written on every review submission.
use super::ReviewOutcome;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: i64,
    pub file_id: String,
    pub reviewed_at: i64,
    #[serde(alias = "result")]
    pub outcome: ReviewOutcome,
    /// Level the file was at before this review.
    pub review_level: u32,
}
