use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{error::Result, AppState};

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramSender>,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramSender {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    pub r#type: String,
}

/// Thin bot front-end: /start, /help and /app all reply with an inline
/// WebApp button pointing at the practice app. Everything else gets a
/// nudge toward the button.
pub async fn handle_webhook(
    State(_state): State<AppState>,
    Json(update): Json<TelegramUpdate>,
) -> Result<impl axum::response::IntoResponse> {
    tracing::info!("Received Telegram webhook update ID: {}", update.update_id);

    if let Some(message) = update.message {
        // Channel posts carry no sender; bots get ignored outright.
        let Some(sender) = &message.from else {
            return Ok(axum::http::StatusCode::OK);
        };
        if sender.is_bot {
            return Ok(axum::http::StatusCode::OK);
        }
        if let Some(text) = &message.text {
            let chat_id = message.chat.id;

            let reply = if text.starts_with("/start") {
                format!(
                    "🎓 Добро пожаловать в GOdrive!\n\n\
                     Приложение для подготовки к теоретическому экзамену на водительские права в Армении.\n\n\
                     👋 Привет, {}!\n\n\
                     Вы можете:\n\
                     • 📚 Изучать билеты в режиме обучения\n\
                     • 🧪 Проходить тестирование\n\
                     • 📊 Просматривать свою статистику\n\
                     • ⚙️ Настраивать профиль\n\n\
                     Нажмите кнопку ниже, чтобы открыть приложение:",
                    sender.first_name
                )
            } else if text.starts_with("/help") {
                "🆘 Справка по использованию бота:\n\n\
                 /start - Начать работу с ботом\n\
                 /help - Показать эту справку\n\
                 /app - Открыть веб-приложение\n\n\
                 📱 Веб-приложение включает:\n\
                 • Режим обучения - изучение билетов с объяснениями\n\
                 • Режим тестирования - проверка знаний\n\
                 • Статистика - ваш прогресс и результаты\n\
                 • Настройки - персональные предпочтения"
                    .to_string()
            } else if text.starts_with("/app") {
                "Нажмите кнопку ниже, чтобы открыть веб-приложение:".to_string()
            } else {
                "Используйте команды или нажмите кнопку для открытия приложения:".to_string()
            };

            let config = crate::config::get_config();
            let reply_markup = serde_json::json!({
                "inline_keyboard": [[
                    {
                        "text": "🚀 Открыть приложение",
                        "web_app": { "url": config.webapp_url }
                    }
                ]]
            });

            send_telegram_message(chat_id, &reply, Some(reply_markup)).await?;
        }
    }

    Ok(axum::http::StatusCode::OK)
}

async fn send_telegram_message(
    chat_id: i64,
    text: &str,
    reply_markup: Option<serde_json::Value>,
) -> Result<()> {
    let config = crate::config::get_config();
    let url = format!(
        "https://api.telegram.org/bot{}/sendMessage",
        config.telegram_bot_token
    );

    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(markup) = reply_markup {
        body["reply_markup"] = markup;
    }

    let client = reqwest::Client::new();
    let response = client.post(&url).json(&body).send().await?;
    if !response.status().is_success() {
        tracing::warn!(
            "Telegram sendMessage failed for chat {}: {}",
            chat_id,
            response.status()
        );
    }

    Ok(())
}
