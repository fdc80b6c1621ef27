use crate::error::Result;
use crate::models::statistics::{CompletedAttemptTotals, StatisticsSnapshot, UserStatistics};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct StatisticsService {
    pool: PgPool,
}

impl StatisticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rebuild the user's statistics row from scratch by scanning their
    /// completed attempts and progress rows. Full overwrite: calling it
    /// twice over the same data converges to the same row.
    pub async fn recompute(&self, user_id: Uuid) -> Result<UserStatistics> {
        let totals = sqlx::query_as::<_, CompletedAttemptTotals>(
            r#"
            SELECT COUNT(*) AS total_attempts,
                   SUM(total_questions) AS total_questions,
                   SUM(correct_answers) AS total_correct,
                   SUM(duration_seconds) AS total_time,
                   MAX(started_at) AS last_attempt_at
            FROM attempts
            WHERE user_id = $1 AND status = 'completed'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let completed_tickets: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM user_ticket_progress
               WHERE user_id = $1 AND is_completed = TRUE"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let snapshot = StatisticsSnapshot::compute(&totals, completed_tickets);

        let stats = sqlx::query_as::<_, UserStatistics>(
            r#"
            INSERT INTO user_statistics
                (user_id, total_attempts, total_questions_answered, total_correct_answers,
                 average_score, completed_tickets_count, total_time_spent_seconds,
                 average_time_per_question, last_attempt_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE
            SET total_attempts = EXCLUDED.total_attempts,
                total_questions_answered = EXCLUDED.total_questions_answered,
                total_correct_answers = EXCLUDED.total_correct_answers,
                average_score = EXCLUDED.average_score,
                completed_tickets_count = EXCLUDED.completed_tickets_count,
                total_time_spent_seconds = EXCLUDED.total_time_spent_seconds,
                average_time_per_question = EXCLUDED.average_time_per_question,
                last_attempt_at = EXCLUDED.last_attempt_at,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(snapshot.total_attempts)
        .bind(snapshot.total_questions_answered)
        .bind(snapshot.total_correct_answers)
        .bind(snapshot.average_score)
        .bind(snapshot.completed_tickets_count)
        .bind(snapshot.total_time_spent_seconds)
        .bind(snapshot.average_time_per_question)
        .bind(snapshot.last_attempt_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
