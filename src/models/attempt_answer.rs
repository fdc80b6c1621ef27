use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user decision on one question within one attempt. Write-once: the
/// (attempt_id, question_id) pair is unique and rows are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttemptAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
    pub is_correct: bool,
    pub time_spent_seconds: i32,
    pub answered_at: DateTime<Utc>,
}
