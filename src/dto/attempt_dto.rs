use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::attempt::Attempt;
use crate::models::attempt_answer::AttemptAnswer;

fn validate_mode(mode: &str) -> Result<(), validator::ValidationError> {
    match mode {
        "learning" | "testing" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_mode")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAttemptRequest {
    pub ticket_id: Uuid,
    #[validate(custom(function = "validate_mode"))]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
    #[serde(default)]
    #[validate(range(min = 0, max = 86400))]
    pub time_spent_seconds: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub correct_option_id: Uuid,
    /// Present in learning mode only.
    pub explanation: Option<String>,
    pub explanation_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptDetailResponse {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub answers: Vec<AttemptAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewEntry {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_image: Option<String>,
    pub selected_option_id: Uuid,
    pub selected_option_text: Option<String>,
    pub correct_option_id: Option<Uuid>,
    pub correct_option_text: Option<String>,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub explanation_image: Option<String>,
    pub time_spent_seconds: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReviewResponse {
    pub attempt: Attempt,
    pub review: Vec<ReviewEntry>,
}
