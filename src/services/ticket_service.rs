use crate::dto::ticket_dto::{
    AnswerOptionView, CategorySummary, LearningQuestionView, TestingQuestionView,
    TicketDetailResponse, TicketForTestingResponse, TicketListItem, TicketProgressEntry,
    TicketProgressSummary,
};
use crate::error::{Error, Result};
use crate::models::progress::TicketProgress;
use crate::models::question::{AnswerOption, Question};
use crate::models::ticket::{Ticket, TicketCategory};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct TicketService {
    pool: PgPool,
}

impl TicketService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Published tickets with the caller's progress summary folded in.
    pub async fn list_published(&self, user_id: Uuid) -> Result<Vec<TicketListItem>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"SELECT * FROM tickets WHERE status = 'published'
               ORDER BY display_order, number"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let categories = self.categories_by_id().await?;
        let progress = self.progress_by_ticket(user_id).await?;

        Ok(tickets
            .into_iter()
            .map(|t| Self::to_list_item(t, &categories, &progress))
            .collect())
    }

    /// Ticket detail for learning mode: explanations included.
    pub async fn get_by_number(&self, number: &str) -> Result<TicketDetailResponse> {
        let ticket = self.published_by_number(number).await?;
        let questions = self.active_questions(ticket.id).await?;
        let mut options = self.options_by_question(&questions).await?;

        let categories = self.categories_by_id().await?;
        let category = ticket
            .category_id
            .and_then(|id| categories.get(&id).cloned());

        let questions = questions
            .into_iter()
            .map(|q| {
                let opts = options.remove(&q.id).unwrap_or_default();
                LearningQuestionView {
                    id: q.id,
                    text: q.text,
                    image: q.image,
                    explanation: q.explanation,
                    explanation_image: q.explanation_image,
                    tags: q.tags,
                    difficulty_level: q.difficulty_level,
                    order: q.display_order,
                    options: opts,
                }
            })
            .collect();

        Ok(TicketDetailResponse {
            id: ticket.id,
            number: ticket.number,
            title: ticket.title,
            description: ticket.description,
            category,
            status: ticket.status,
            order: ticket.display_order,
            questions_count: ticket.questions_count,
            questions,
            created_at: ticket.created_at,
            published_at: ticket.published_at,
        })
    }

    /// Ticket shape for testing mode: no explanations, no correctness
    /// flags on options.
    pub async fn get_for_testing(&self, number: &str) -> Result<TicketForTestingResponse> {
        let ticket = self.published_by_number(number).await?;
        self.testing_view(ticket).await
    }

    /// Random published ticket, excluding already-completed ones when
    /// the user has that preference enabled.
    pub async fn random_ticket(
        &self,
        user_id: Uuid,
        exclude_passed: bool,
    ) -> Result<TicketForTestingResponse> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM tickets
            WHERE status = 'published'
              AND (NOT $2 OR id NOT IN (
                  SELECT ticket_id FROM user_ticket_progress
                  WHERE user_id = $1 AND is_completed = TRUE
              ))
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(exclude_passed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("No available tickets".to_string()))?;

        self.testing_view(ticket).await
    }

    /// Explanation lookup for a single question of a published ticket.
    pub async fn question_explanation(&self, question_id: Uuid) -> Result<LearningQuestionView> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.* FROM questions q
            JOIN tickets t ON t.id = q.ticket_id
            WHERE q.id = $1 AND t.status = 'published'
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let options = sqlx::query_as::<_, AnswerOption>(
            r#"SELECT * FROM answer_options WHERE question_id = $1 ORDER BY display_order"#,
        )
        .bind(question.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(LearningQuestionView {
            id: question.id,
            text: question.text,
            image: question.image,
            explanation: question.explanation,
            explanation_image: question.explanation_image,
            tags: question.tags,
            difficulty_level: question.difficulty_level,
            order: question.display_order,
            options: options.into_iter().map(Self::to_option_view).collect(),
        })
    }

    /// The caller's progress rows, most recently updated first.
    pub async fn list_progress(&self, user_id: Uuid) -> Result<Vec<TicketProgressEntry>> {
        let rows = sqlx::query_as::<_, TicketProgress>(
            r#"SELECT * FROM user_ticket_progress WHERE user_id = $1
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"SELECT * FROM tickets WHERE status = 'published'"#,
        )
        .fetch_all(&self.pool)
        .await?;
        let tickets: HashMap<Uuid, Ticket> = tickets.into_iter().map(|t| (t.id, t)).collect();

        let categories = self.categories_by_id().await?;
        let progress_map: HashMap<Uuid, TicketProgress> =
            rows.iter().map(|p| (p.ticket_id, p.clone())).collect();

        let entries = rows
            .into_iter()
            .filter_map(|p| {
                let ticket = tickets.get(&p.ticket_id)?.clone();
                Some(TicketProgressEntry {
                    id: p.id,
                    ticket: Self::to_list_item(ticket, &categories, &progress_map),
                    is_completed: p.is_completed,
                    completed_at: p.completed_at,
                    attempts_count: p.attempts_count,
                    best_score: p.best_score,
                    total_questions_answered: p.total_questions_answered,
                    correct_answers_count: p.correct_answers_count,
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                })
            })
            .collect();

        Ok(entries)
    }

    async fn published_by_number(&self, number: &str) -> Result<Ticket> {
        sqlx::query_as::<_, Ticket>(
            r#"SELECT * FROM tickets WHERE number = $1 AND status = 'published'"#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Ticket not found".to_string()))
    }

    async fn testing_view(&self, ticket: Ticket) -> Result<TicketForTestingResponse> {
        let questions = self.active_questions(ticket.id).await?;
        let mut options = self.options_by_question(&questions).await?;

        let questions = questions
            .into_iter()
            .map(|q| TestingQuestionView {
                id: q.id,
                text: q.text,
                image: q.image,
                order: q.display_order,
                options: options.remove(&q.id).unwrap_or_default(),
            })
            .collect();

        Ok(TicketForTestingResponse {
            id: ticket.id,
            number: ticket.number,
            title: ticket.title,
            questions,
        })
    }

    async fn active_questions(&self, ticket_id: Uuid) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE ticket_id = $1 AND is_active = TRUE
               ORDER BY display_order"#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn options_by_question(
        &self,
        questions: &[Question],
    ) -> Result<HashMap<Uuid, Vec<AnswerOptionView>>> {
        let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let options = sqlx::query_as::<_, AnswerOption>(
            r#"SELECT * FROM answer_options WHERE question_id = ANY($1)
               ORDER BY display_order"#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<AnswerOptionView>> = HashMap::new();
        for option in options {
            grouped
                .entry(option.question_id)
                .or_default()
                .push(Self::to_option_view(option));
        }
        Ok(grouped)
    }

    async fn categories_by_id(&self) -> Result<HashMap<Uuid, CategorySummary>> {
        let categories = sqlx::query_as::<_, TicketCategory>(
            r#"SELECT * FROM ticket_categories WHERE is_active = TRUE"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories
            .into_iter()
            .map(|c| {
                (
                    c.id,
                    CategorySummary {
                        id: c.id,
                        name: c.name,
                        description: c.description,
                        order: c.display_order,
                    },
                )
            })
            .collect())
    }

    async fn progress_by_ticket(&self, user_id: Uuid) -> Result<HashMap<Uuid, TicketProgress>> {
        let rows = sqlx::query_as::<_, TicketProgress>(
            r#"SELECT * FROM user_ticket_progress WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|p| (p.ticket_id, p)).collect())
    }

    fn to_option_view(option: AnswerOption) -> AnswerOptionView {
        AnswerOptionView {
            id: option.id,
            text: option.text,
            image: option.image,
            option_type: option.option_type,
            order: option.display_order,
        }
    }

    fn to_list_item(
        ticket: Ticket,
        categories: &HashMap<Uuid, CategorySummary>,
        progress: &HashMap<Uuid, TicketProgress>,
    ) -> TicketListItem {
        let user_progress = progress
            .get(&ticket.id)
            .map(|p| TicketProgressSummary {
                is_completed: p.is_completed,
                completed_at: p.completed_at,
                attempts_count: p.attempts_count,
                best_score: p.best_score,
            })
            .unwrap_or_default();

        TicketListItem {
            id: ticket.id,
            number: ticket.number,
            title: ticket.title,
            description: ticket.description,
            category: ticket
                .category_id
                .and_then(|id| categories.get(&id).cloned()),
            status: ticket.status,
            order: ticket.display_order,
            questions_count: ticket.questions_count,
            user_progress,
            created_at: ticket.created_at,
            published_at: ticket.published_at,
        }
    }
}
