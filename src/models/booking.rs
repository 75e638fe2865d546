use serde::{Deserialize, Serialize};

use crate::models::session::LessonType;

/// Append-only record of a confirmed booking. One row in the remote sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub full_name: String,
    pub lesson_type: LessonType,
    pub slot: String,
    pub user_id: String,
}
