use crate::error::Result;
use crate::models::progress::TicketProgress;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Maintains the per-(user, ticket) rollup. Runs inside the attempt
/// completion transaction; the row is taken under FOR UPDATE so the
/// cumulative counters see a serialized read-modify-write.
pub struct ProgressService;

impl ProgressService {
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        ticket_id: Uuid,
        correct_answers: i32,
        total_questions: i32,
        now: DateTime<Utc>,
    ) -> Result<TicketProgress> {
        // Lazily create the row on the first completion for this pair.
        sqlx::query(
            r#"
            INSERT INTO user_ticket_progress (user_id, ticket_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, ticket_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(ticket_id)
        .execute(&mut **tx)
        .await?;

        let mut progress = sqlx::query_as::<_, TicketProgress>(
            r#"
            SELECT * FROM user_ticket_progress
            WHERE user_id = $1 AND ticket_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(ticket_id)
        .fetch_one(&mut **tx)
        .await?;

        progress.record_attempt(correct_answers, total_questions, now);

        let updated = sqlx::query_as::<_, TicketProgress>(
            r#"
            UPDATE user_ticket_progress
            SET attempts_count = $1,
                best_score = $2,
                total_questions_answered = $3,
                correct_answers_count = $4,
                is_completed = $5,
                completed_at = $6,
                updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(progress.attempts_count)
        .bind(progress.best_score)
        .bind(progress.total_questions_answered)
        .bind(progress.correct_answers_count)
        .bind(progress.is_completed)
        .bind(progress.completed_at)
        .bind(now)
        .bind(progress.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(updated)
    }
}
