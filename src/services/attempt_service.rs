use crate::dto::attempt_dto::{
    AttemptDetailResponse, AttemptReviewResponse, CreateAttemptRequest, ReviewEntry,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::error::{Error, Result};
use crate::models::attempt::{Attempt, FinalizedScore};
use crate::models::attempt_answer::AttemptAnswer;
use crate::models::question::{AnswerOption, Question};
use crate::models::ticket::Ticket;
use crate::services::progress_service::ProgressService;
use crate::services::statistics_service::StatisticsService;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a new attempt on a published ticket. The question count is
    /// snapshotted at creation time and not recomputed later.
    pub async fn create_attempt(
        &self,
        user_id: Uuid,
        req: CreateAttemptRequest,
    ) -> Result<Attempt> {
        let ticket = sqlx::query_as::<_, Ticket>(r#"SELECT * FROM tickets WHERE id = $1"#)
            .bind(req.ticket_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Ticket not found".to_string()))?;

        if ticket.status != "published" {
            return Err(Error::InvalidState("Ticket is not published".to_string()));
        }

        let total_questions: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM questions WHERE ticket_id = $1 AND is_active = TRUE"#,
        )
        .bind(ticket.id)
        .fetch_one(&self.pool)
        .await?;

        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (user_id, ticket_id, mode, status, total_questions)
            VALUES ($1, $2, $3, 'in_progress', $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(ticket.id)
        .bind(&req.mode)
        .bind(total_questions as i32)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            attempt_id = %attempt.id,
            ticket = %ticket.number,
            mode = %attempt.mode,
            "attempt started"
        );
        Ok(attempt)
    }

    /// Record one answer for one question of an in-progress attempt.
    ///
    /// The ledger is write-once per (attempt, question): a second answer
    /// for the same question is rejected with Conflict and leaves the
    /// first record untouched. Correctness is read from the chosen
    /// option's flag, and the attempt counter moves in the same
    /// transaction as the inserted record.
    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE id = $1 AND user_id = $2"#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        if attempt.status != "in_progress" {
            return Err(Error::InvalidState("Attempt is not in progress".to_string()));
        }

        let question = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE id = $1 AND ticket_id = $2 AND is_active = TRUE"#,
        )
        .bind(req.question_id)
        .bind(attempt.ticket_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let selected_option = sqlx::query_as::<_, AnswerOption>(
            r#"SELECT * FROM answer_options WHERE id = $1 AND question_id = $2"#,
        )
        .bind(req.selected_option_id)
        .bind(question.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Answer option not found".to_string()))?;

        let is_correct = selected_option.is_correct;

        sqlx::query(
            r#"
            INSERT INTO attempt_answers
                (attempt_id, question_id, selected_option_id, is_correct, time_spent_seconds)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(attempt.id)
        .bind(question.id)
        .bind(selected_option.id)
        .bind(is_correct)
        .bind(req.time_spent_seconds)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if err
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false)
            {
                Error::Conflict("Answer already submitted for this question".to_string())
            } else {
                err.into()
            }
        })?;

        if is_correct {
            sqlx::query(
                r#"UPDATE attempts SET correct_answers = correct_answers + 1, updated_at = NOW()
                   WHERE id = $1"#,
            )
            .bind(attempt.id)
            .execute(&mut *tx)
            .await?;
        }

        let correct_option = sqlx::query_as::<_, AnswerOption>(
            r#"SELECT * FROM answer_options
               WHERE question_id = $1 AND is_correct = TRUE
               ORDER BY display_order LIMIT 1"#,
        )
        .bind(question.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Internal("Question has no correct option".to_string()))?;

        tx.commit().await?;

        // Learning mode reveals the explanation immediately; testing
        // mode withholds it until the review.
        let learning = attempt.mode == "learning";
        Ok(SubmitAnswerResponse {
            is_correct,
            correct_option_id: correct_option.id,
            explanation: if learning { question.explanation } else { None },
            explanation_image: if learning { question.explanation_image } else { None },
        })
    }

    /// Finalize an in-progress attempt: derive score and duration, flip
    /// the status and fold the result into the ticket progress, all in
    /// one transaction.
    ///
    /// The status flip is a conditional UPDATE keyed on
    /// status = 'in_progress', so two racing completions cannot both
    /// succeed and progress is recorded exactly once.
    pub async fn complete_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> Result<Attempt> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE id = $1 AND user_id = $2"#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        if attempt.status != "in_progress" {
            return Err(Error::InvalidState("Attempt is not in progress".to_string()));
        }

        let now = Utc::now();
        let score = FinalizedScore::compute(
            attempt.correct_answers,
            attempt.total_questions,
            attempt.started_at,
            now,
        );

        let finalized = sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET status = 'completed',
                completed_at = $1,
                duration_seconds = $2,
                score_percentage = $3,
                is_passed = $4,
                updated_at = $1
            WHERE id = $5 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(score.duration_seconds)
        .bind(score.score_percentage)
        .bind(score.is_passed)
        .bind(attempt.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::InvalidState("Attempt is not in progress".to_string()))?;

        ProgressService::record(
            &mut tx,
            finalized.user_id,
            finalized.ticket_id,
            finalized.correct_answers,
            finalized.total_questions,
            now,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            attempt_id = %finalized.id,
            score = finalized.score_percentage,
            passed = finalized.is_passed,
            "attempt completed"
        );

        StatisticsService::new(self.pool.clone())
            .recompute(user_id)
            .await?;

        Ok(finalized)
    }

    /// Terminal status flip with no scoring side effects.
    pub async fn abandon_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> Result<Attempt> {
        sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET status = 'abandoned', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::InvalidState("Attempt is not in progress".to_string()))
    }

    pub async fn list_attempts(&self, user_id: Uuid) -> Result<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE user_id = $1 ORDER BY started_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    pub async fn get_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> Result<AttemptDetailResponse> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE id = $1 AND user_id = $2"#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        let answers = sqlx::query_as::<_, AttemptAnswer>(
            r#"SELECT * FROM attempt_answers WHERE attempt_id = $1 ORDER BY answered_at"#,
        )
        .bind(attempt.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AttemptDetailResponse { attempt, answers })
    }

    /// Per-question breakdown of a completed attempt, explanations
    /// included regardless of mode. The correct option is the lowest
    /// display_order one, so each answer yields exactly one row even
    /// if several options carry the correct flag.
    pub async fn get_review(&self, user_id: Uuid, attempt_id: Uuid) -> Result<AttemptReviewResponse> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE id = $1 AND user_id = $2 AND status = 'completed'"#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Completed attempt not found".to_string()))?;

        let review = sqlx::query_as::<_, ReviewEntry>(
            r#"
            SELECT aa.question_id,
                   q.text AS question_text,
                   q.image AS question_image,
                   aa.selected_option_id,
                   so.text AS selected_option_text,
                   co.id AS correct_option_id,
                   co.text AS correct_option_text,
                   aa.is_correct,
                   q.explanation,
                   q.explanation_image,
                   aa.time_spent_seconds
            FROM attempt_answers aa
            JOIN questions q ON q.id = aa.question_id
            JOIN answer_options so ON so.id = aa.selected_option_id
            LEFT JOIN LATERAL (
                SELECT id, text FROM answer_options
                WHERE question_id = q.id AND is_correct = TRUE
                ORDER BY display_order LIMIT 1
            ) co ON TRUE
            WHERE aa.attempt_id = $1
            ORDER BY aa.answered_at
            "#,
        )
        .bind(attempt.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AttemptReviewResponse { attempt, review })
    }
}
