//! Habit CRUD operations
//!
//! Every query is scoped by owner, so a habit id belonging to another user
//! behaves exactly like a missing one.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::validation::{HabitUpdate, NewHabit};

/// Habit row with completion summary
#[derive(Debug, Clone, Serialize)]
pub struct HabitRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub emoji: String,
    pub goal_days: u32,
    pub created_at: String,
    pub updated_at: String,
    pub completions_count: u32,
    pub last_completed: Option<String>,
    /// Filled in by the caller, which knows what "today" is
    pub current_streak: u32,
}

impl HabitRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            emoji: row.get("emoji")?,
            goal_days: row.get("goal_days")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completions_count: row.get("completions_count")?,
            last_completed: row.get("last_completed")?,
            current_streak: 0,
        })
    }
}

const SELECT_HABIT: &str = "
    SELECT h.id, h.user_id, h.title, h.description, h.emoji, h.goal_days,
           h.created_at, h.updated_at,
           (SELECT COUNT(*) FROM habit_completions c WHERE c.habit_id = h.id) AS completions_count,
           (SELECT MAX(c.completed_at) FROM habit_completions c
             WHERE c.habit_id = h.id) AS last_completed
    FROM habits h";

/// All habits of a user, newest first
pub fn list_habits(conn: &Connection, user_id: i64) -> Result<Vec<HabitRow>, AppError> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE h.user_id = ?1 ORDER BY h.created_at DESC, h.id DESC",
        SELECT_HABIT
    ))?;
    let rows = stmt
        .query_map([user_id], HabitRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// A single habit owned by `user_id`
pub fn get_habit(
    conn: &Connection,
    user_id: i64,
    habit_id: i64,
) -> Result<Option<HabitRow>, AppError> {
    let row = conn
        .query_row(
            &format!("{} WHERE h.id = ?1 AND h.user_id = ?2", SELECT_HABIT),
            params![habit_id, user_id],
            HabitRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Whether `habit_id` exists and belongs to `user_id`
pub fn habit_exists(conn: &Connection, user_id: i64, habit_id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM habits WHERE id = ?1 AND user_id = ?2",
            params![habit_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Ids of all habits of a user
pub fn habit_ids(conn: &Connection, user_id: i64) -> Result<Vec<i64>, AppError> {
    let mut stmt = conn.prepare_cached("SELECT id FROM habits WHERE user_id = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

pub fn create_habit(
    conn: &Connection,
    user_id: i64,
    habit: &NewHabit,
) -> Result<HabitRow, AppError> {
    conn.execute(
        "INSERT INTO habits (user_id, title, description, emoji, goal_days)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, habit.title, habit.description, habit.emoji, habit.goal_days],
    )?;
    let id = conn.last_insert_rowid();
    debug!(user_id, habit_id = id, "Created habit");

    get_habit(conn, user_id, id)?
        .ok_or_else(|| AppError::Internal(format!("habit {} vanished after insert", id)))
}

/// Apply a partial update; `None` when the habit is not found
pub fn update_habit(
    conn: &Connection,
    user_id: i64,
    habit_id: i64,
    update: &HabitUpdate,
) -> Result<Option<HabitRow>, AppError> {
    let (set_description, description) = match &update.description {
        Some(description) => (true, description.as_deref()),
        None => (false, None),
    };
    let changed = conn.execute(
        "UPDATE habits SET
            title = COALESCE(?1, title),
            description = CASE WHEN ?7 THEN ?2 ELSE description END,
            emoji = COALESCE(?3, emoji),
            goal_days = COALESCE(?4, goal_days),
            updated_at = datetime('now')
         WHERE id = ?5 AND user_id = ?6",
        params![
            update.title,
            description,
            update.emoji,
            update.goal_days,
            habit_id,
            user_id,
            set_description
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    debug!(user_id, habit_id, "Updated habit");
    get_habit(conn, user_id, habit_id)
}

/// Delete a habit and its completions. Lifetime stats are left untouched.
pub fn delete_habit(conn: &Connection, user_id: i64, habit_id: i64) -> Result<bool, AppError> {
    let deleted = conn.execute(
        "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
        params![habit_id, user_id],
    )?;
    if deleted > 0 {
        debug!(user_id, habit_id, "Deleted habit");
    }
    Ok(deleted > 0)
}
