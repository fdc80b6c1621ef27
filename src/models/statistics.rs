use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user summary, a pure function of the user's completed attempts
/// and progress rows. Never maintained incrementally: the stored row is
/// overwritten wholesale on every read and every attempt completion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStatistics {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_attempts: i32,
    pub total_questions_answered: i32,
    pub total_correct_answers: i32,
    pub average_score: f64,
    pub completed_tickets_count: i32,
    pub total_time_spent_seconds: i32,
    pub average_time_per_question: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQL aggregate over the user's completed attempts.
#[derive(Debug, Clone, Default, FromRow)]
pub struct CompletedAttemptTotals {
    pub total_attempts: i64,
    pub total_questions: Option<i64>,
    pub total_correct: Option<i64>,
    pub total_time: Option<i64>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// The recomputed values, before they are written back.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub total_attempts: i32,
    pub total_questions_answered: i32,
    pub total_correct_answers: i32,
    pub average_score: f64,
    pub completed_tickets_count: i32,
    pub total_time_spent_seconds: i32,
    pub average_time_per_question: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl StatisticsSnapshot {
    pub fn compute(totals: &CompletedAttemptTotals, completed_tickets_count: i64) -> Self {
        let total_questions = totals.total_questions.unwrap_or(0);
        let total_correct = totals.total_correct.unwrap_or(0);
        let total_time = totals.total_time.unwrap_or(0);

        let (average_score, average_time_per_question) = if total_questions > 0 {
            (
                total_correct as f64 / total_questions as f64 * 100.0,
                total_time as f64 / total_questions as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total_attempts: totals.total_attempts as i32,
            total_questions_answered: total_questions as i32,
            total_correct_answers: total_correct as i32,
            average_score,
            completed_tickets_count: completed_tickets_count as i32,
            total_time_spent_seconds: total_time as i32,
            average_time_per_question,
            last_attempt_at: totals.last_attempt_at,
        }
    }
}

/// "2ч 5м" formatting used by the statistics screen.
pub fn format_total_time(total_seconds: i32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}ч {}м", hours, minutes)
}
