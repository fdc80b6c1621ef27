use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;

use crate::models::user::User;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    let tickets = state.ticket_service.list_published(user.id).await?;
    Ok(Json(tickets).into_response())
}

#[axum::debug_handler]
pub async fn ticket_detail(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> crate::error::Result<Response> {
    let ticket = state.ticket_service.get_by_number(&number).await?;
    Ok(Json(ticket).into_response())
}

#[axum::debug_handler]
pub async fn ticket_for_testing(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> crate::error::Result<Response> {
    let ticket = state.ticket_service.get_for_testing(&number).await?;
    Ok(Json(ticket).into_response())
}

#[axum::debug_handler]
pub async fn random_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    let ticket = state
        .ticket_service
        .random_ticket(user.id, user.exclude_passed_tickets)
        .await?;
    Ok(Json(ticket).into_response())
}

#[axum::debug_handler]
pub async fn list_progress(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> crate::error::Result<Response> {
    let progress = state.ticket_service.list_progress(user.id).await?;
    Ok(Json(progress).into_response())
}

#[axum::debug_handler]
pub async fn question_explanation(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let question = state.ticket_service.question_explanation(question_id).await?;
    Ok(Json(question).into_response())
}
