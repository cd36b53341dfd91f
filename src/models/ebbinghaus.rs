//! Fixed-interval forgetting-curve scheduler.
//!
//! Every file sits on a ladder of review levels. Each level maps to a wait
//! time in minutes taken from the interval table:
//! - Remembered: climb one level (capped at the top) and wait that level's interval
//! - Forgotten: drop back to level 0 and wait the first interval
//! - The top level is a plateau; only a forgotten outcome leaves it
//!
//! All functions here are pure. Persisting the returned level and timestamp
//! is the record layer's job.

use super::ReviewOutcome;
use crate::error::{AppError, Result};
use crate::time::{DAY_MS, HOUR_MS, MINUTE_MS, now_millis};
use serde::{Deserialize, Serialize};

/// Default ladder: 5 minutes up to 15 days.
pub const REVIEW_INTERVALS: [u32; 8] = [5, 30, 720, 1440, 2880, 5760, 10080, 21600];

/// Ordered per-level wait times in minutes. Never empty, no zero entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct IntervalTable {
    minutes: Vec<u32>,
}

/// Result of applying an outcome to a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledReview {
    pub level: u32,
    pub next_review_at: i64,
}

impl IntervalTable {
    pub fn new(minutes: Vec<u32>) -> Result<Self> {
        if minutes.is_empty() {
            return Err(AppError::InvalidIntervals(
                "at least one interval is required".to_string(),
            ));
        }
        if let Some(pos) = minutes.iter().position(|&m| m == 0) {
            return Err(AppError::InvalidIntervals(format!(
                "interval at level {} must be positive",
                pos
            )));
        }
        Ok(Self { minutes })
    }

    /// Parses a comma separated list such as `"5, 30, 720"`.
    pub fn parse(input: &str) -> Result<Self> {
        let minutes = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| AppError::InvalidIntervals(format!("'{}' is not a number", s)))
            })
            .collect::<Result<Vec<u32>>>()?;
        Self::new(minutes)
    }

    pub fn minutes(&self) -> &[u32] {
        &self.minutes
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    pub fn max_level(&self) -> u32 {
        (self.minutes.len() - 1) as u32
    }

    fn interval_ms(&self, level: u32) -> i64 {
        let idx = level.min(self.max_level()) as usize;
        self.minutes[idx] as i64 * MINUTE_MS
    }

    /// Applies `outcome` to `current_level`. Levels beyond the table clamp to the top.
    pub fn schedule(
        &self,
        current_level: u32,
        outcome: ReviewOutcome,
        reference_time: Option<i64>,
    ) -> ScheduledReview {
        let base = reference_time.unwrap_or_else(now_millis);
        let level = match outcome {
            ReviewOutcome::Forgotten => 0,
            ReviewOutcome::Remembered => current_level.saturating_add(1).min(self.max_level()),
        };
        ScheduledReview {
            level,
            next_review_at: base + self.interval_ms(level),
        }
    }

    /// Next due timestamp for `current_level` after `outcome`.
    pub fn next_review_time(
        &self,
        current_level: u32,
        outcome: ReviewOutcome,
        reference_time: Option<i64>,
    ) -> i64 {
        self.schedule(current_level, outcome, reference_time)
            .next_review_at
    }

    /// Position on the ladder as 0..=100.
    pub fn progress_percent(&self, current_level: u32) -> u8 {
        let max = self.max_level();
        if max == 0 {
            return 100;
        }
        let level = current_level.min(max) as f64;
        (level / max as f64 * 100.0).round() as u8
    }
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            minutes: REVIEW_INTERVALS.to_vec(),
        }
    }
}

impl TryFrom<Vec<u32>> for IntervalTable {
    type Error = AppError;

    fn try_from(minutes: Vec<u32>) -> Result<Self> {
        Self::new(minutes)
    }
}

impl From<IntervalTable> for Vec<u32> {
    fn from(table: IntervalTable) -> Self {
        table.minutes
    }
}

/// Equality counts as due.
pub fn is_due(next_review_at: i64, now: i64) -> bool {
    now >= next_review_at
}

/// Coarse "time until due" label using only the largest nonzero unit.
pub fn describe_time_until_due(next_review_at: i64, now: i64) -> String {
    let diff = next_review_at - now;
    if diff <= 0 {
        return "overdue".to_string();
    }

    let days = diff / DAY_MS;
    let hours = diff / HOUR_MS;
    let minutes = diff / MINUTE_MS;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
