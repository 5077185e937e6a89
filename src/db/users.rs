//! User records and per-user stats

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::telegram::TelegramUser;
use crate::error::AppError;

/// User joined with their stats
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
    pub experience: u64,
    pub total_completions: u64,
}

impl UserRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            telegram_id: row.get("telegram_id")?,
            username: row.get("username")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            photo_url: row.get("photo_url")?,
            experience: row.get::<_, i64>("experience")?.max(0) as u64,
            total_completions: row.get::<_, i64>("total_completions")?.max(0) as u64,
        })
    }
}

/// Experience and lifetime completions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub experience: u64,
    pub total_completions: u64,
}

/// Create the user on first sign-in, otherwise refresh their profile fields.
///
/// Returns the internal user id.
pub fn upsert_telegram_user(conn: &mut Connection, user: &TelegramUser) -> Result<i64, AppError> {
    let tx = conn.transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM users WHERE telegram_id = ?1",
            [user.id],
            |row| row.get(0),
        )
        .optional()?;

    let user_id = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3, photo_url = ?4,
                        updated_at = datetime('now')
                 WHERE id = ?5",
                params![user.username, user.first_name, user.last_name, user.photo_url, id],
            )?;
            debug!(user_id = id, telegram_id = user.id, "Refreshed user profile");
            id
        }
        None => {
            tx.execute(
                "INSERT INTO users (telegram_id, username, first_name, last_name, photo_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.id, user.username, user.first_name, user.last_name, user.photo_url],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute("INSERT INTO user_stats (user_id) VALUES (?1)", [id])?;
            tx.execute("INSERT INTO notification_settings (user_id) VALUES (?1)", [id])?;
            info!(user_id = id, telegram_id = user.id, "Registered new user");
            id
        }
    };

    tx.commit()?;
    Ok(user_id)
}

/// User with stats, if the user exists
pub fn get_user_with_stats(conn: &Connection, user_id: i64) -> Result<Option<UserRow>, AppError> {
    let row = conn
        .query_row(
            "SELECT u.id, u.telegram_id, u.username, u.first_name, u.last_name, u.photo_url,
                    COALESCE(s.experience, 0) AS experience,
                    COALESCE(s.total_completions, 0) AS total_completions
             FROM users u
             LEFT JOIN user_stats s ON s.user_id = u.id
             WHERE u.id = ?1",
            [user_id],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Stats for a user (zeros when no stats row exists)
pub fn get_stats(conn: &Connection, user_id: i64) -> Result<UserStats, AppError> {
    let stats = conn
        .query_row(
            "SELECT experience, total_completions FROM user_stats WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(UserStats {
                    experience: row.get::<_, i64>(0)?.max(0) as u64,
                    total_completions: row.get::<_, i64>(1)?.max(0) as u64,
                })
            },
        )
        .optional()?;
    Ok(stats.unwrap_or_default())
}
