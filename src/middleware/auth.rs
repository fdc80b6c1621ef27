use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;

use crate::utils::telegram_auth::verify_init_data;
use crate::AppState;

pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Resolves the caller's identity from the `X-Telegram-Init-Data`
/// header and stores the full user row in request extensions. Handlers
/// and services only ever see the resolved user; the signature scheme
/// stays behind this boundary.
pub async fn require_telegram_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(raw) = req.headers().get(INIT_DATA_HEADER) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing_init_data"})),
        )
            .into_response();
    };
    let Ok(init_data) = raw.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "bad_init_data"})),
        )
            .into_response();
    };

    let config = crate::config::get_config();
    let tg_user = match verify_init_data(
        init_data,
        &config.telegram_bot_token,
        Utc::now().timestamp(),
    ) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    match state.user_service.get_or_create_from_telegram(&tg_user).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
