use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub file_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}
