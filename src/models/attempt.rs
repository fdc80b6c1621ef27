use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One run of a ticket by one user.
///
/// `score_percentage`, `is_passed` and `duration_seconds` are derived at
/// completion through [`FinalizedScore::compute`] and never set directly
/// by callers. Status transitions: in_progress -> completed | abandoned,
/// both terminal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Uuid,
    pub mode: String,
    pub status: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score_percentage: i32,
    pub is_passed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived completion fields for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedScore {
    pub score_percentage: i32,
    pub is_passed: bool,
    pub duration_seconds: i32,
}

impl FinalizedScore {
    /// Percentage uses integer truncation: 9/10 correct is 90, 99/100 is
    /// 99. An attempt passes only on a full 100.
    pub fn compute(
        correct_answers: i32,
        total_questions: i32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let score_percentage = score_percent(correct_answers, total_questions);
        let duration_seconds = (completed_at - started_at).num_seconds().max(0) as i32;
        Self {
            score_percentage,
            is_passed: score_percentage == 100,
            duration_seconds,
        }
    }
}

pub fn score_percent(correct_answers: i32, total_questions: i32) -> i32 {
    if total_questions > 0 {
        correct_answers * 100 / total_questions
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn percentage_truncates_instead_of_rounding() {
        assert_eq!(score_percent(9, 10), 90);
        assert_eq!(score_percent(99, 100), 99);
        assert_eq!(score_percent(2, 3), 66);
        assert_eq!(score_percent(3, 3), 100);
        assert_eq!(score_percent(0, 10), 0);
    }

    #[test]
    fn empty_ticket_scores_zero() {
        assert_eq!(score_percent(0, 0), 0);
    }

    #[test]
    fn passed_only_on_full_score() {
        let started = Utc::now();
        let done = started + Duration::seconds(95);

        let nine_of_ten = FinalizedScore::compute(9, 10, started, done);
        assert_eq!(nine_of_ten.score_percentage, 90);
        assert!(!nine_of_ten.is_passed);

        let perfect = FinalizedScore::compute(3, 3, started, done);
        assert_eq!(perfect.score_percentage, 100);
        assert!(perfect.is_passed);
        assert_eq!(perfect.duration_seconds, 95);
    }

    #[test]
    fn duration_is_whole_seconds_and_never_negative() {
        let started = Utc::now();
        let done = started + Duration::milliseconds(61_900);
        let score = FinalizedScore::compute(1, 1, started, done);
        assert_eq!(score.duration_seconds, 61);

        let clock_skew = FinalizedScore::compute(1, 1, started, started - Duration::seconds(5));
        assert_eq!(clock_skew.duration_seconds, 0);
    }
}
