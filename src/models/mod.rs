pub mod ebbinghaus;
pub mod note;
pub mod reading_history;
pub mod review_outcome;
pub mod review_record;
pub mod review_session;
pub mod review_task;
pub mod reviewable_file;
pub mod settings;

pub use ebbinghaus::{IntervalTable, REVIEW_INTERVALS, ScheduledReview};
pub use note::Note;
pub use reading_history::{ReadingHistory, RecentReading};
pub use review_outcome::ReviewOutcome;
pub use review_record::ReviewRecord;
pub use review_session::ReviewSession;
pub use review_task::{ReviewStats, ReviewTask};
pub use reviewable_file::{ReviewableFile, generate_file_id};
pub use settings::{Theme, UserSettings};
