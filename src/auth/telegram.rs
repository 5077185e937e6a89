//! Telegram Mini App initData verification
//!
//! The Mini App passes `initData`, a URL-encoded query string signed by
//! Telegram. The check is:
//!
//! 1. Remove `hash`, sort remaining `key=value` pairs by key, join with `\n`
//! 2. `secret = HMAC-SHA256(key = "WebAppData", msg = bot_token)`
//! 3. `hash == hex(HMAC-SHA256(key = secret, msg = data_check_string))`
//!
//! `auth_date` must also be recent enough when a max age is configured.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Telegram user as embedded in initData
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Verifies initData against the bot token
#[derive(Clone)]
pub struct InitDataValidator {
    bot_token: Option<String>,
    max_age_secs: u64,
}

impl std::fmt::Debug for InitDataValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataValidator")
            .field("configured", &self.bot_token.is_some())
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}

impl InitDataValidator {
    /// `max_age_secs == 0` disables the freshness check
    pub fn new(bot_token: Option<String>, max_age_secs: u64) -> Self {
        Self {
            bot_token: bot_token.filter(|t| !t.is_empty()),
            max_age_secs,
        }
    }

    /// Verify `init_data` at Unix time `now` and return the embedded user
    pub fn validate(&self, init_data: &str, now: u64) -> Result<TelegramUser, AppError> {
        let bot_token = self
            .bot_token
            .as_deref()
            .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not configured".into()))?;

        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(init_data)
            .map_err(|e| AppError::Auth(format!("Malformed initData: {}", e)))?;

        let hash = pairs
            .iter()
            .find(|(k, _)| k == "hash")
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| AppError::Auth("initData is missing hash".into()))?;
        let expected =
            hex::decode(hash).map_err(|_| AppError::Auth("Invalid initData hash".into()))?;

        let mut mac = signing_mac(bot_token)?;
        mac.update(data_check_string(&pairs).as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| AppError::Auth("initData signature mismatch".into()))?;

        if self.max_age_secs > 0 {
            let auth_date: u64 = field(&pairs, "auth_date")
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| AppError::Auth("initData is missing auth_date".into()))?;
            if now.saturating_sub(auth_date) > self.max_age_secs {
                return Err(AppError::Auth("initData expired".into()));
            }
        }

        let user_json = field(&pairs, "user")
            .ok_or_else(|| AppError::Auth("Could not read user from initData".into()))?;
        let user: TelegramUser = serde_json::from_str(user_json)
            .map_err(|_| AppError::Auth("Could not read user from initData".into()))?;

        debug!(telegram_id = user.id, "initData verified");
        Ok(user)
    }
}

/// Build a signed initData string (for dev tooling and tests)
pub fn sign_init_data(fields: &[(&str, &str)], bot_token: &str) -> Result<String, AppError> {
    let pairs: Vec<(String, String)> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut mac = signing_mac(bot_token)?;
    mac.update(data_check_string(&pairs).as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut signed = pairs;
    signed.push(("hash".to_string(), hash));
    serde_urlencoded::to_string(&signed).map_err(|e| AppError::Internal(e.to_string()))
}

fn field<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut fields: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| k != "hash").collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn signing_mac(bot_token: &str) -> Result<HmacSha256, AppError> {
    let mut secret = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    HmacSha256::new_from_slice(&secret_key).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456:TEST-bot-token";
    const NOW: u64 = 1_700_000_000;
    const USER: &str =
        r#"{"id":279058397,"first_name":"Vlad","username":"vdkfrost","language_code":"ru"}"#;

    fn signed(auth_date: u64) -> String {
        let auth_date = auth_date.to_string();
        sign_init_data(
            &[("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"), ("user", USER), ("auth_date", &auth_date)],
            TOKEN,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_init_data() {
        let validator = InitDataValidator::new(Some(TOKEN.into()), 86_400);
        let user = validator.validate(&signed(NOW - 60), NOW).unwrap();
        assert_eq!(user.id, 279_058_397);
        assert_eq!(user.username.as_deref(), Some("vdkfrost"));
        assert!(user.last_name.is_none());
    }

    #[test]
    fn test_tampered_data_rejected() {
        let validator = InitDataValidator::new(Some(TOKEN.into()), 0);
        let tampered = signed(NOW).replace("279058397", "279058398");
        assert!(matches!(validator.validate(&tampered, NOW), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_wrong_bot_token_rejected() {
        let validator = InitDataValidator::new(Some("654321:OTHER".into()), 0);
        assert!(validator.validate(&signed(NOW), NOW).is_err());
    }

    #[test]
    fn test_expired_init_data() {
        let validator = InitDataValidator::new(Some(TOKEN.into()), 3600);
        let err = validator.validate(&signed(NOW - 7200), NOW).unwrap_err();
        assert!(err.to_string().contains("expired"));

        let lenient = InitDataValidator::new(Some(TOKEN.into()), 0);
        assert!(lenient.validate(&signed(NOW - 7200), NOW).is_ok());
    }

    #[test]
    fn test_missing_hash_or_user() {
        let validator = InitDataValidator::new(Some(TOKEN.into()), 0);
        assert!(validator.validate("auth_date=1&user=%7B%7D", NOW).is_err());

        let no_user = sign_init_data(&[("auth_date", "1")], TOKEN).unwrap();
        let err = validator.validate(&no_user, NOW).unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_unconfigured_token() {
        let validator = InitDataValidator::new(None, 0);
        assert!(matches!(validator.validate(&signed(NOW), NOW), Err(AppError::Config(_))));

        let empty = InitDataValidator::new(Some(String::new()), 0);
        assert!(matches!(empty.validate(&signed(NOW), NOW), Err(AppError::Config(_))));
    }

    #[test]
    fn test_data_check_string_is_sorted() {
        let pairs = vec![
            ("user".to_string(), "u".to_string()),
            ("hash".to_string(), "h".to_string()),
            ("auth_date".to_string(), "1".to_string()),
        ];
        assert_eq!(data_check_string(&pairs), "auth_date=1\nuser=u");
    }
}
