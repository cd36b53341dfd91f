//! Review session over the files due today.
//! Files answered "forgotten" come back in a later round until remembered.

use super::{ReviewOutcome, ReviewTask};
use crate::database::db;
use crate::error::{AppError, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct SessionItem {
    pub task: ReviewTask,
    pub remembered: bool,
}

/// Walks the due list one file at a time, writing every outcome through the record layer.
pub struct ReviewSession {
    pub items: Vec<SessionItem>,
    pub current_round: Vec<usize>,
    pub current_index: usize,
    pub round_number: usize,
    pub conn: Arc<Mutex<Connection>>,
}

impl ReviewSession {
    pub fn new_from_tasks(tasks: Vec<ReviewTask>, conn: Arc<Mutex<Connection>>) -> Self {
        let items: Vec<SessionItem> = tasks
            .into_iter()
            .map(|task| SessionItem {
                task,
                remembered: false,
            })
            .collect();
        let indices = (0..items.len()).collect();

        Self {
            items,
            current_round: indices,
            current_index: 0,
            round_number: 1,
            conn,
        }
    }

    pub fn current_task(&self) -> Option<&ReviewTask> {
        self.current_round
            .get(self.current_index)
            .and_then(|&idx| self.items.get(idx))
            .map(|item| &item.task)
    }

    /// Records the outcome for the current file and moves on.
    pub fn submit(&mut self, outcome: ReviewOutcome, now: i64) -> Result<()> {
        let Some(&idx) = self.current_round.get(self.current_index) else {
            return Ok(());
        };

        {
            let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
            let scheduled = db::submit_review(&self.items[idx].task.file_id, outcome, now, &conn)?;
            let item = &mut self.items[idx];
            item.task.review_level = scheduled.level;
            item.task.last_reviewed_at = now;
            item.task.next_review_at = scheduled.next_review_at;
            item.remembered = outcome == ReviewOutcome::Remembered;
        }

        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        if self.current_index + 1 < self.current_round.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the files answered "forgotten".
    /// If there are none, the session is complete.
    fn start_next_round(&mut self) {
        let forgotten: Vec<usize> = self
            .current_round
            .iter()
            .copied()
            .filter(|&idx| self.items.get(idx).is_some_and(|item| !item.remembered))
            .collect();

        self.current_index = 0;
        if forgotten.is_empty() {
            self.current_round.clear();
        } else {
            self.current_round = forgotten;
            self.round_number += 1;
        }
    }

    pub fn remembered_count(&self) -> usize {
        self.items.iter().filter(|item| item.remembered).count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.remembered_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} files", self.round_number, self.current_round.len())
        } else {
            format!(
                "Round {} (Retry): {} files to review again",
                self.round_number,
                self.current_round.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewableFile;
    use crate::time::DAY_MS;

    const T: i64 = 1_700_000_000_000;

    fn session_with(paths: &[&str]) -> ReviewSession {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        for path in paths {
            let file = ReviewableFile::new(path, path, String::new(), 0, T, T);
            db::upsert_file(&file, &conn).unwrap();
            db::mark_as_learned(&file.id, T - 1000, &conn).unwrap();
        }
        let tasks = db::get_today_review_tasks(T, T + DAY_MS, &conn).unwrap();
        ReviewSession::new_from_tasks(tasks, Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_all_remembered_completes_in_one_round() {
        let mut session = session_with(&["a.md", "b.md"]);
        assert_eq!(session.total_count(), 2);

        session.submit(ReviewOutcome::Remembered, T).unwrap();
        session.submit(ReviewOutcome::Remembered, T).unwrap();

        assert!(session.is_completed());
        assert_eq!(session.round_number, 1);
        assert_eq!(session.remaining_count(), 0);
    }

    #[test]
    fn test_forgotten_file_is_retried() {
        let mut session = session_with(&["a.md", "b.md"]);
        let first = session.current_task().unwrap().file_id.clone();

        session.submit(ReviewOutcome::Forgotten, T).unwrap();
        session.submit(ReviewOutcome::Remembered, T).unwrap();

        assert!(!session.is_completed());
        assert_eq!(session.round_number, 2);
        assert_eq!(session.current_task().unwrap().file_id, first);
        assert_eq!(session.current_task().unwrap().review_level, 0);

        session.submit(ReviewOutcome::Remembered, T + 1).unwrap();
        assert!(session.is_completed());

        let conn = session.conn.lock().unwrap();
        let file = db::get_file(&first, &conn).unwrap();
        assert_eq!(file.review_level, 1);
        assert_eq!(db::get_review_history(Some(&first), &conn).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_session_is_complete() {
        let mut session = session_with(&[]);
        assert!(session.is_completed());
        assert!(session.current_task().is_none());
        session.submit(ReviewOutcome::Remembered, T).unwrap();
    }
}
