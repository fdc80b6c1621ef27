use axum::{
    routing::{get, post},
    Router,
};
use godrive_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let bot_token = config.telegram_bot_token.clone();
        let target_webhook_url = format!("{}/api/webhook/telegram", config.webapp_url);

        info!("Checking Telegram webhook status...");
        match reqwest::get(format!(
            "https://api.telegram.org/bot{}/getWebhookInfo",
            bot_token
        ))
        .await
        {
            Ok(resp) => {
                if let Ok(info) = resp.json::<serde_json::Value>().await {
                    let current_url = info["result"]["url"].as_str().unwrap_or("");
                    if current_url == target_webhook_url {
                        info!("Telegram webhook is already up to date: {}", current_url);
                    } else {
                        info!(
                            "Updating Telegram webhook: {} -> {}",
                            current_url, target_webhook_url
                        );
                        let set_url = format!(
                            "https://api.telegram.org/bot{}/setWebhook?url={}",
                            bot_token, target_webhook_url
                        );
                        if let Ok(set_resp) = reqwest::get(&set_url).await {
                            if set_resp.status().is_success() {
                                info!("Telegram webhook registered successfully");
                            } else {
                                tracing::warn!(
                                    "Failed to register Telegram webhook: {:?}",
                                    set_resp.status()
                                );
                            }
                        }
                    }
                }
            }
            Err(e) => tracing::warn!("Could not check Telegram webhook status: {:?}", e),
        }
    }

    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/webhook/telegram", post(routes::telegram::handle_webhook));

    let api = Router::new()
        .route("/api/tickets", get(routes::tickets::list_tickets))
        .route("/api/tickets/random", get(routes::tickets::random_ticket))
        .route("/api/tickets/progress", get(routes::tickets::list_progress))
        .route("/api/tickets/:number", get(routes::tickets::ticket_detail))
        .route(
            "/api/tickets/:number/testing",
            get(routes::tickets::ticket_for_testing),
        )
        .route(
            "/api/questions/:id/explanation",
            get(routes::tickets::question_explanation),
        )
        .route(
            "/api/attempts",
            get(routes::attempts::list_attempts).post(routes::attempts::create_attempt),
        )
        .route("/api/attempts/:id", get(routes::attempts::get_attempt))
        .route(
            "/api/attempts/:id/answers",
            post(routes::attempts::submit_answer),
        )
        .route(
            "/api/attempts/:id/complete",
            post(routes::attempts::complete_attempt),
        )
        .route(
            "/api/attempts/:id/abandon",
            post(routes::attempts::abandon_attempt),
        )
        .route("/api/attempts/:id/review", get(routes::attempts::get_review))
        .route(
            "/api/users/profile",
            get(routes::users::get_profile).patch(routes::users::update_profile),
        )
        .route("/api/users/statistics", get(routes::users::get_statistics))
        .route("/api/users/activity", post(routes::users::update_activity))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            godrive_backend::middleware::auth::require_telegram_user,
        ))
        .layer(axum::middleware::from_fn_with_state(
            godrive_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            godrive_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
