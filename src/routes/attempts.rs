use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{CreateAttemptRequest, SubmitAnswerRequest};
use crate::models::user::User;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    let attempts = state.attempt_service.list_attempts(user.id).await?;
    Ok(Json(attempts).into_response())
}

#[axum::debug_handler]
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateAttemptRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let attempt = state.attempt_service.create_attempt(user.id, req).await?;
    Ok((axum::http::StatusCode::CREATED, Json(attempt)).into_response())
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let detail = state.attempt_service.get_attempt(user.id, attempt_id).await?;
    Ok(Json(detail).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let result = state
        .attempt_service
        .submit_answer(user.id, attempt_id, req)
        .await?;
    Ok(Json(result).into_response())
}

#[axum::debug_handler]
pub async fn complete_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state
        .attempt_service
        .complete_attempt(user.id, attempt_id)
        .await?;
    Ok(Json(attempt).into_response())
}

#[axum::debug_handler]
pub async fn abandon_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state
        .attempt_service
        .abandon_attempt(user.id, attempt_id)
        .await?;
    Ok(Json(attempt).into_response())
}

#[axum::debug_handler]
pub async fn get_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let review = state.attempt_service.get_review(user.id, attempt_id).await?;
    Ok(Json(review).into_response())
}
