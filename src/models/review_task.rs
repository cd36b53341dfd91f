//! Derived views over files and review records.

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewTask {
    pub file_id: String,
    pub file_name: String,
    pub last_reviewed_at: i64,
    pub next_review_at: i64,
    pub review_level: u32,
    pub overdue: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewStats {
    pub total_files: usize,
    pub learned_files: usize,
    pub total_reviews: usize,
    /// Percent of reviews answered "remembered"; 100 when there are none.
    pub retention_rate: u8,
}
