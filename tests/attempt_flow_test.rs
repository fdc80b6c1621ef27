use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value as JsonValue};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

const BOT_TOKEN: &str = "1234567:test-token";

fn signed_init_data(telegram_id: i64) -> String {
    let user = json!({
        "id": telegram_id,
        "first_name": "Test",
        "username": "flow_tester"
    })
    .to_string();
    let auth_date = chrono::Utc::now().timestamp().to_string();

    let mut pairs = vec![("auth_date", auth_date.as_str()), ("user", user.as_str())];
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let data_check_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret = Hmac::<Sha256>::new_from_slice(b"WebAppData").unwrap();
    secret.update(BOT_TOKEN.as_bytes());
    let secret_key = secret.finalize().into_bytes();
    let mut mac = Hmac::<Sha256>::new_from_slice(&secret_key).unwrap();
    mac.update(data_check_string.as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

async fn seed_ticket(pool: &sqlx::PgPool) -> (Uuid, Vec<(Uuid, Uuid, Uuid)>) {
    let number = format!("t-{}", &Uuid::new_v4().to_string()[..8]);
    let ticket_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO tickets (number, title, status, questions_count, published_at)
           VALUES ($1, $2, 'published', 2, NOW()) RETURNING id"#,
    )
    .bind(&number)
    .bind(format!("Ticket {}", number))
    .fetch_one(pool)
    .await
    .expect("seed ticket");

    // Two questions with one correct and one wrong option each.
    let mut questions = Vec::new();
    for order in 0..2 {
        let question_id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO questions (ticket_id, text, explanation, display_order)
               VALUES ($1, $2, 'Because the sign says so.', $3) RETURNING id"#,
        )
        .bind(ticket_id)
        .bind(format!("Question {}", order))
        .bind(order)
        .fetch_one(pool)
        .await
        .expect("seed question");

        let correct_id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO answer_options (question_id, text, is_correct, display_order)
               VALUES ($1, 'Right', TRUE, 0) RETURNING id"#,
        )
        .bind(question_id)
        .fetch_one(pool)
        .await
        .expect("seed correct option");
        let wrong_id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO answer_options (question_id, text, is_correct, display_order)
               VALUES ($1, 'Wrong', FALSE, 1) RETURNING id"#,
        )
        .bind(question_id)
        .fetch_one(pool)
        .await
        .expect("seed wrong option");

        questions.push((question_id, correct_id, wrong_id));
    }
    (ticket_id, questions)
}

fn build_app(app_state: godrive_backend::AppState) -> Router {
    Router::new()
        .route("/api/tickets", get(godrive_backend::routes::tickets::list_tickets))
        .route(
            "/api/attempts",
            post(godrive_backend::routes::attempts::create_attempt),
        )
        .route(
            "/api/attempts/:id/answers",
            post(godrive_backend::routes::attempts::submit_answer),
        )
        .route(
            "/api/attempts/:id/complete",
            post(godrive_backend::routes::attempts::complete_attempt),
        )
        .route(
            "/api/attempts/:id/review",
            get(godrive_backend::routes::attempts::get_review),
        )
        .route(
            "/api/users/statistics",
            get(godrive_backend::routes::users::get_statistics),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            godrive_backend::middleware::auth::require_telegram_user,
        ))
        .with_state(app_state)
}

async fn setup() -> Option<sqlx::PgPool> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("TELEGRAM_BOT_TOKEN", BOT_TOKEN);
    env::set_var("WEBAPP_URL", "http://localhost");
    env::set_var("PUBLIC_RPS", "100");

    let _ = godrive_backend::config::init_config();
    let pool = godrive_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    Some(pool)
}

fn fresh_telegram_id() -> i64 {
    9_000_000 + (Uuid::new_v4().as_u128() % 1_000_000_000) as i64
}

#[tokio::test]
async fn learning_attempt_end_to_end() {
    let Some(pool) = setup().await else { return };

    let (ticket_id, questions) = seed_ticket(&pool).await;
    let app = build_app(godrive_backend::AppState::new(pool.clone()));

    let init_data = signed_init_data(fresh_telegram_id());

    // Unsigned requests are rejected before any handler runs.
    let req = Request::builder()
        .method("GET")
        .uri("/api/tickets")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/api/attempts")
        .header("x-telegram-init-data", &init_data)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"ticket_id": ticket_id, "mode": "learning"}).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let attempt: JsonValue = serde_json::from_slice(&bytes).unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();
    assert_eq!(attempt["status"], "in_progress");
    assert_eq!(attempt["total_questions"], 2);

    // First question right, second wrong.
    let (q1, q1_correct, _) = questions[0];
    let (q2, _, q2_wrong) = questions[1];

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/answers", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"question_id": q1, "selected_option_id": q1_correct, "time_spent_seconds": 7})
                .to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["is_correct"], true);
    // Learning mode reveals the explanation immediately.
    assert!(body["explanation"].is_string());

    // Answering the same question twice is a conflict.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/answers", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"question_id": q1, "selected_option_id": q1_correct}).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/answers", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"question_id": q2, "selected_option_id": q2_wrong, "time_spent_seconds": 4})
                .to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["is_correct"], false);
    assert_eq!(body["correct_option_id"].as_str().unwrap(), questions[1].1.to_string());

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/complete", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let completed: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["score_percentage"], 50);
    assert_eq!(completed["is_passed"], false);

    // Completing twice is an invalid state transition.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/attempts/{}/complete", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/attempts/{}/review", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let review: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(review["review"].as_array().unwrap().len(), 2);

    let req = Request::builder()
        .method("GET")
        .uri("/api/users/statistics")
        .header("x-telegram-init-data", &init_data)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let stats: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["total_attempts"], 1);
    assert_eq!(stats["total_questions_answered"], 2);
    assert_eq!(stats["total_correct_answers"], 1);
    assert!(stats["total_time_formatted"].as_str().unwrap().contains("ч"));
}

#[tokio::test]
async fn concurrent_completion_has_a_single_winner() {
    let Some(pool) = setup().await else { return };

    let (ticket_id, questions) = seed_ticket(&pool).await;
    // Flag a second option on the first question as correct so the
    // review has to pick one deterministically.
    sqlx::query("UPDATE answer_options SET is_correct = TRUE WHERE id = $1")
        .bind(questions[0].2)
        .execute(&pool)
        .await
        .expect("flag extra correct option");

    let app = build_app(godrive_backend::AppState::new(pool.clone()));
    let init_data = signed_init_data(fresh_telegram_id());

    let req = Request::builder()
        .method("POST")
        .uri("/api/attempts")
        .header("x-telegram-init-data", &init_data)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"ticket_id": ticket_id, "mode": "testing"}).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let attempt: JsonValue = serde_json::from_slice(&bytes).unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();
    let user_id: Uuid = attempt["user_id"].as_str().unwrap().parse().unwrap();

    let (q1, q1_correct, _) = questions[0];
    let (q2, _, q2_wrong) = questions[1];
    for (question_id, option_id) in [(q1, q1_correct), (q2, q2_wrong)] {
        let req = Request::builder()
            .method("POST")
            .uri(format!("/api/attempts/{}/answers", attempt_id))
            .header("x-telegram-init-data", &init_data)
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"question_id": question_id, "selected_option_id": option_id}).to_string(),
            ))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Two racing completions: exactly one wins, the loser sees the
    // conditional status flip match nothing and gets a conflict.
    let complete_req = || {
        Request::builder()
            .method("POST")
            .uri(format!("/api/attempts/{}/complete", attempt_id))
            .header("x-telegram-init-data", &init_data)
            .body(Body::empty())
            .unwrap()
    };
    let (first, second) = tokio::join!(
        app.clone().oneshot(complete_req()),
        app.clone().oneshot(complete_req())
    );
    let mut statuses = [first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    // Progress was folded in exactly once.
    let attempts_count: i32 = sqlx::query_scalar(
        r#"SELECT attempts_count FROM user_ticket_progress
           WHERE user_id = $1 AND ticket_id = $2"#,
    )
    .bind(user_id)
    .bind(ticket_id)
    .fetch_one(&pool)
    .await
    .expect("progress row");
    assert_eq!(attempts_count, 1);

    // One review row per answer, and the doubly-flagged question
    // resolves to its lowest display_order correct option.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/attempts/{}/review", attempt_id))
        .header("x-telegram-init-data", &init_data)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let review: JsonValue = serde_json::from_slice(&bytes).unwrap();
    let entries = review["review"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let q1_str = q1.to_string();
    let q1_entry = entries
        .iter()
        .find(|e| e["question_id"].as_str() == Some(q1_str.as_str()))
        .expect("entry for first question");
    assert_eq!(
        q1_entry["correct_option_id"].as_str().unwrap(),
        q1_correct.to_string()
    );
}
