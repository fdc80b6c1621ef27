use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

fn validate_language(language: &str) -> Result<(), validator::ValidationError> {
    match language {
        "hy" | "ru" | "en" => Ok(()),
        _ => Err(validator::ValidationError::new("unsupported_language")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "validate_language"))]
    pub language: Option<String>,
    pub exclude_passed_tickets: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatisticsResponse {
    pub total_attempts: i32,
    pub total_questions_answered: i32,
    pub total_correct_answers: i32,
    pub average_score: f64,
    pub completed_tickets_count: i32,
    pub total_time_spent_seconds: i32,
    pub average_time_per_question: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub accuracy_percentage: f64,
    pub total_time_formatted: String,
}
