use crate::dto::user_dto::UpdateProfileRequest;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::telegram_auth::TelegramUser;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert by telegram_id: creates the user on first contact, keeps
    /// the Telegram profile fields fresh and touches last_activity.
    pub async fn get_or_create_from_telegram(&self, tg: &TelegramUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, telegram_username, telegram_first_name, telegram_last_name, last_activity)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (telegram_id) DO UPDATE
            SET telegram_username = EXCLUDED.telegram_username,
                telegram_first_name = EXCLUDED.telegram_first_name,
                telegram_last_name = EXCLUDED.telegram_last_name,
                last_activity = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tg.id)
        .bind(&tg.username)
        .bind(&tg.first_name)
        .bind(&tg.last_name)
        .fetch_one(&self.pool)
        .await?;

        if !user.is_active {
            return Err(Error::Unauthorized("User is deactivated".to_string()));
        }
        Ok(user)
    }

    pub async fn update_profile(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET language = COALESCE($1, language),
                exclude_passed_tickets = COALESCE($2, exclude_passed_tickets),
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&req.language)
        .bind(req.exclude_passed_tickets)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn touch_activity(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(r#"UPDATE users SET last_activity = NOW() WHERE id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
