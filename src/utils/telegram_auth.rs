use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// initData older than this is rejected outright.
pub const INIT_DATA_MAX_AGE_SECONDS: i64 = 86_400;

/// The `user` payload carried inside verified initData.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Verify a Telegram WebApp initData string against the bot token and
/// return the embedded user.
///
/// Recipe: secret = HMAC-SHA256("WebAppData", bot_token); the received
/// hash must equal HMAC-SHA256(secret, data_check_string), where
/// data_check_string is the decoded key=value pairs (hash excluded),
/// sorted by key and joined with newlines.
pub fn verify_init_data(init_data: &str, bot_token: &str, now_unix: i64) -> Result<TelegramUser> {
    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let hash_pos = pairs
        .iter()
        .position(|(k, _)| k == "hash")
        .ok_or_else(|| Error::Unauthorized("No hash in init data".to_string()))?;
    let (_, received_hash) = pairs.remove(hash_pos);

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret = HmacSha256::new_from_slice(b"WebAppData")
        .map_err(|e| Error::Internal(e.to_string()))?;
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key)
        .map_err(|e| Error::Internal(e.to_string()))?;
    mac.update(data_check_string.as_bytes());
    let calculated = mac.finalize().into_bytes();

    let received = hex::decode(received_hash.as_bytes())
        .map_err(|_| Error::Unauthorized("Malformed hash in init data".to_string()))?;
    if calculated.ct_eq(received.as_slice()).unwrap_u8() != 1 {
        return Err(Error::Unauthorized("Invalid init data hash".to_string()));
    }

    let auth_date: i64 = pairs
        .iter()
        .find(|(k, _)| k == "auth_date")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    if now_unix - auth_date > INIT_DATA_MAX_AGE_SECONDS {
        return Err(Error::Unauthorized("Init data expired".to_string()));
    }

    let user_json = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| Error::Unauthorized("No user in init data".to_string()))?;
    serde_json::from_str(user_json)
        .map_err(|_| Error::Unauthorized("Malformed user in init data".to_string()))
}
