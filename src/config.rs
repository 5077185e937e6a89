//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::gamification::GamificationConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub gamification: GamificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret, at least 32 characters outside dev mode
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// Reject initData older than this (0 disables the check)
    #[serde(default = "default_init_data_max_age")]
    pub init_data_max_age_secs: u64,

    /// Allow a built-in JWT secret
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token used both for initData verification and sending reminders
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether the daily reminder job runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local hour of the daily reminder
    #[serde(default = "default_reminder_hour")]
    pub hour: u32,

    /// Local minute of the daily reminder
    #[serde(default)]
    pub minute: u32,

    /// Reminder text
    #[serde(default = "default_reminder_message")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Zone used for "today" and the reminder schedule, minutes east of UTC
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

// Defaults
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3001 }
fn default_database_path() -> PathBuf { PathBuf::from("habits.db") }
fn default_token_expiry() -> u64 { 30 * 24 * 60 * 60 } // 30 days
fn default_init_data_max_age() -> u64 { 24 * 60 * 60 }
fn default_api_base() -> String { "https://api.telegram.org".to_string() }
fn default_true() -> bool { true }
fn default_reminder_hour() -> u32 { 20 }
fn default_reminder_message() -> String { "Don't forget to check off your habits!".to_string() }
fn default_utc_offset() -> i32 { 180 } // Europe/Moscow

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_secs: default_token_expiry(),
            init_data_max_age_secs: default_init_data_max_age(),
            dev_mode: false,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_api_base(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_reminder_hour(),
            minute: 0,
            message: default_reminder_message(),
        }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), AppError> {
        if self.notifications.hour > 23 || self.notifications.minute > 59 {
            return Err(AppError::Config(format!(
                "invalid reminder time {:02}:{:02}",
                self.notifications.hour, self.notifications.minute
            )));
        }
        if self.gamification.base_xp == 0 {
            return Err(AppError::Config("gamification.base_xp must be positive".into()));
        }
        if !(self.gamification.growth_ratio > 1.0) {
            return Err(AppError::Config(
                "gamification.growth_ratio must be greater than 1".into(),
            ));
        }
        if self.time.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::Config("time.utc_offset_minutes out of range".into()));
        }
        Ok(())
    }
}
