use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
}

/// The caller's rollup for one ticket, embedded in ticket listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketProgressSummary {
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempts_count: i32,
    pub best_score: i32,
}

impl Default for TicketProgressSummary {
    fn default() -> Self {
        Self {
            is_completed: false,
            completed_at: None,
            attempts_count: 0,
            best_score: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketListItem {
    pub id: Uuid,
    pub number: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<CategorySummary>,
    pub status: String,
    pub order: i32,
    pub questions_count: i32,
    pub user_progress: TicketProgressSummary,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOptionView {
    pub id: Uuid,
    pub text: Option<String>,
    pub image: Option<String>,
    pub option_type: String,
    pub order: i32,
}

/// Question shape for learning mode: explanations included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningQuestionView {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub explanation: Option<String>,
    pub explanation_image: Option<String>,
    pub tags: Option<String>,
    pub difficulty_level: i32,
    pub order: i32,
    pub options: Vec<AnswerOptionView>,
}

/// Question shape for testing mode: no explanations, no correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingQuestionView {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub order: i32,
    pub options: Vec<AnswerOptionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailResponse {
    pub id: Uuid,
    pub number: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<CategorySummary>,
    pub status: String,
    pub order: i32,
    pub questions_count: i32,
    pub questions: Vec<LearningQuestionView>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketForTestingResponse {
    pub id: Uuid,
    pub number: String,
    pub title: String,
    pub questions: Vec<TestingQuestionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketProgressEntry {
    pub id: Uuid,
    pub ticket: TicketListItem,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempts_count: i32,
    pub best_score: i32,
    pub total_questions_answered: i32,
    pub correct_answers_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
