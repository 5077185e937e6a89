//! Habit completions
//!
//! A completion is unique per (habit, date). Toggling either inserts the
//! row and rewards the user, or removes it and takes the reward back. It
//! runs inside the caller's transaction so stats never drift from the
//! completion rows, and so follow-up writes such as achievement awards
//! commit or roll back together with it.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::AppError;

/// Outcome of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The date is now marked done
    Completed,
    /// The existing completion was removed
    Removed,
}

impl ToggleOutcome {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Flip the completion of `habit_id` on `date`.
///
/// The caller must have checked that the habit belongs to `user_id`, and
/// commits `tx`.
pub fn toggle_completion(
    tx: &Transaction,
    user_id: i64,
    habit_id: i64,
    date: NaiveDate,
    xp_per_completion: u64,
) -> Result<ToggleOutcome, AppError> {
    let xp = i64::try_from(xp_per_completion)
        .map_err(|_| AppError::Config("xp_per_completion too large".into()))?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM habit_completions WHERE habit_id = ?1 AND completed_at = ?2",
            params![habit_id, date],
            |row| row.get(0),
        )
        .optional()?;

    let outcome = match existing {
        Some(id) => {
            tx.execute("DELETE FROM habit_completions WHERE id = ?1", [id])?;
            tx.execute(
                "UPDATE user_stats SET
                    total_completions = MAX(total_completions - 1, 0),
                    experience = MAX(experience - ?1, 0),
                    updated_at = datetime('now')
                 WHERE user_id = ?2",
                params![xp, user_id],
            )?;
            ToggleOutcome::Removed
        }
        None => {
            tx.execute(
                "INSERT INTO habit_completions (habit_id, completed_at) VALUES (?1, ?2)",
                params![habit_id, date],
            )?;
            tx.execute(
                "INSERT INTO user_stats (user_id, experience, total_completions) VALUES (?1, ?2, 1)
                 ON CONFLICT(user_id) DO UPDATE SET
                    total_completions = total_completions + 1,
                    experience = experience + ?2,
                    updated_at = datetime('now')",
                params![user_id, xp],
            )?;
            ToggleOutcome::Completed
        }
    };

    debug!(user_id, habit_id, %date, ?outcome, "Toggled completion");
    Ok(outcome)
}

/// Every completion date of a habit, newest first
pub fn dates_for_habit(conn: &Connection, habit_id: i64) -> Result<Vec<NaiveDate>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT completed_at FROM habit_completions WHERE habit_id = ?1 ORDER BY completed_at DESC",
    )?;
    let dates = stmt
        .query_map([habit_id], |row| row.get(0))?
        .collect::<Result<Vec<NaiveDate>, _>>()?;
    Ok(dates)
}

/// Completion dates within a calendar month, oldest first
pub fn dates_in_month(
    conn: &Connection,
    habit_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<NaiveDate>, AppError> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Ok(Vec::new());
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    let mut stmt = conn.prepare_cached(
        "SELECT completed_at FROM habit_completions
         WHERE habit_id = ?1 AND completed_at >= ?2 AND (?3 IS NULL OR completed_at < ?3)
         ORDER BY completed_at",
    )?;
    let dates = stmt
        .query_map(params![habit_id, first, next], |row| row.get(0))?
        .collect::<Result<Vec<NaiveDate>, _>>()?;

    debug_assert!(dates.iter().all(|d| d.year() == year && d.month() == month));
    Ok(dates)
}

/// Completion dates on or after `since`, newest first
pub fn dates_since(
    conn: &Connection,
    habit_id: i64,
    since: NaiveDate,
) -> Result<Vec<NaiveDate>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT completed_at FROM habit_completions
         WHERE habit_id = ?1 AND completed_at >= ?2
         ORDER BY completed_at DESC",
    )?;
    let dates = stmt
        .query_map(params![habit_id, since], |row| row.get(0))?
        .collect::<Result<Vec<NaiveDate>, _>>()?;
    Ok(dates)
}
