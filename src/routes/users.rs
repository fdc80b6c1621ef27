use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::dto::user_dto::{UpdateProfileRequest, UserStatisticsResponse};
use crate::models::statistics::format_total_time;
use crate::models::user::User;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_profile(Extension(user): Extension<User>) -> crate::error::Result<Response> {
    Ok(Json(user).into_response())
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateProfileRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let updated = state.user_service.update_profile(user.id, req).await?;
    Ok(Json(updated).into_response())
}

/// Statistics are recomputed from the completed attempts on every read,
/// never served from the stored row as-is.
#[axum::debug_handler]
pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    let stats = state.statistics_service.recompute(user.id).await?;
    let response = UserStatisticsResponse {
        total_attempts: stats.total_attempts,
        total_questions_answered: stats.total_questions_answered,
        total_correct_answers: stats.total_correct_answers,
        average_score: stats.average_score,
        completed_tickets_count: stats.completed_tickets_count,
        total_time_spent_seconds: stats.total_time_spent_seconds,
        average_time_per_question: stats.average_time_per_question,
        last_attempt_at: stats.last_attempt_at,
        accuracy_percentage: stats.average_score,
        total_time_formatted: format_total_time(stats.total_time_spent_seconds),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn update_activity(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    state.user_service.touch_activity(user.id).await?;
    Ok(Json(json!({ "status": "success" })).into_response())
}
