use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::attempt::score_percent;

/// Per-(user, ticket) lifetime rollup across all completed attempts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Uuid,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempts_count: i32,
    pub best_score: i32,
    pub total_questions_answered: i32,
    pub correct_answers_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketProgress {
    /// Fold one completed attempt into the rollup.
    ///
    /// The score fed into `best_score` is recomputed over the cumulative
    /// lifetime counters, not the attempt's own percentage. A user who
    /// scores 50 and then 100 on a 10-question ticket ends up with
    /// best_score 75. Inherited aggregate definition; callers must not
    /// swap in the per-attempt percentage.
    pub fn record_attempt(
        &mut self,
        correct_answers: i32,
        total_questions: i32,
        now: DateTime<Utc>,
    ) {
        self.total_questions_answered += total_questions;
        self.correct_answers_count += correct_answers;
        self.attempts_count += 1;

        let score = score_percent(self.correct_answers_count, self.total_questions_answered);
        self.best_score = self.best_score.max(score);

        // Latches: once completed, never reverts.
        if score == 100 && !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(user_id: Uuid, ticket_id: Uuid) -> TicketProgress {
        let now = Utc::now();
        TicketProgress {
            id: Uuid::new_v4(),
            user_id,
            ticket_id,
            is_completed: false,
            completed_at: None,
            attempts_count: 0,
            best_score: 0,
            total_questions_answered: 0,
            correct_answers_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_perfect_attempt_completes_the_ticket() {
        let mut progress = fresh(Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        progress.record_attempt(3, 3, now);

        assert_eq!(progress.attempts_count, 1);
        assert_eq!(progress.best_score, 100);
        assert!(progress.is_completed);
        assert_eq!(progress.completed_at, Some(now));
    }

    #[test]
    fn best_score_tracks_cumulative_accuracy_not_best_attempt() {
        let mut progress = fresh(Uuid::new_v4(), Uuid::new_v4());
        progress.record_attempt(5, 10, Utc::now());
        assert_eq!(progress.best_score, 50);

        // A later perfect attempt only lifts the cumulative ratio to
        // 15/20 = 75, so the ticket is still not completed.
        progress.record_attempt(10, 10, Utc::now());
        assert_eq!(progress.total_questions_answered, 20);
        assert_eq!(progress.correct_answers_count, 15);
        assert_eq!(progress.best_score, 75);
        assert!(!progress.is_completed);
    }

    #[test]
    fn best_score_is_monotonic() {
        let mut progress = fresh(Uuid::new_v4(), Uuid::new_v4());
        progress.record_attempt(9, 10, Utc::now());
        assert_eq!(progress.best_score, 90);

        progress.record_attempt(0, 10, Utc::now());
        assert_eq!(progress.best_score, 90);
        assert_eq!(progress.attempts_count, 2);
    }

    #[test]
    fn completion_never_reverts() {
        let mut progress = fresh(Uuid::new_v4(), Uuid::new_v4());
        let first = Utc::now();
        progress.record_attempt(10, 10, first);
        assert!(progress.is_completed);

        progress.record_attempt(0, 10, Utc::now());
        assert!(progress.is_completed);
        assert_eq!(progress.completed_at, Some(first));
    }
}
