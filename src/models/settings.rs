//! User preferences, persisted as JSON in the settings table.
use super::IntervalTable;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub font_size: f32,
    pub content_width: f32,
    #[serde(rename = "reviewInterval")]
    pub review_intervals: IntervalTable,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: 16.0,
            content_width: 800.0,
            review_intervals: IntervalTable::default(),
        }
    }
}
