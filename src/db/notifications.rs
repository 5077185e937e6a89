//! Reminder settings

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

/// Whether a user receives the daily reminder (defaults to enabled)
pub fn reminders_enabled(conn: &Connection, user_id: i64) -> Result<bool, AppError> {
    let enabled: Option<bool> = conn
        .query_row(
            "SELECT enabled FROM notification_settings WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(enabled.unwrap_or(true))
}

pub fn set_reminders_enabled(
    conn: &Connection,
    user_id: i64,
    enabled: bool,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO notification_settings (user_id, enabled) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET enabled = ?2, updated_at = datetime('now')",
        params![user_id, enabled],
    )?;
    Ok(())
}

/// Telegram chat ids of every user with reminders enabled
pub fn reminder_recipients(conn: &Connection) -> Result<Vec<i64>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT u.telegram_id FROM users u
         JOIN notification_settings ns ON ns.user_id = u.id
         WHERE ns.enabled = 1
         ORDER BY u.id",
    )?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}
