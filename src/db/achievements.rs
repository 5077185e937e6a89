//! Achievement catalog and awards

use std::collections::HashSet;

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::gamification::{AchievementDefinition, EarnedAchievement};

/// Catalog entry annotated for a user
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub requirement: u32,
    pub earned: bool,
    pub earned_at: Option<String>,
}

impl CatalogEntry {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            title: row.get("title")?,
            description: row.get("description")?,
            icon: row.get("icon")?,
            requirement: row.get("requirement")?,
            earned: row.get("earned")?,
            earned_at: row.get("earned_at")?,
        })
    }
}

/// Insert catalog entries that are not present yet. Existing rows are kept.
pub fn seed_definitions(
    conn: &mut Connection,
    definitions: &[AchievementDefinition],
) -> Result<usize, AppError> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO achievements (code, title, description, icon, requirement)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for def in definitions {
            inserted += stmt.execute(params![
                def.code,
                def.title,
                def.description,
                def.icon,
                def.requirement
            ])?;
        }
    }
    tx.commit()?;

    if inserted > 0 {
        info!(inserted, "Seeded achievement definitions");
    }
    Ok(inserted)
}

/// The whole catalog
pub fn definitions(conn: &Connection) -> Result<Vec<AchievementDefinition>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT code, title, description, icon, requirement FROM achievements
         ORDER BY requirement, id",
    )?;
    let defs = stmt
        .query_map([], |row| {
            Ok(AchievementDefinition {
                code: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                icon: row.get(3)?,
                requirement: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(defs)
}

/// Codes already earned by a user
pub fn earned_codes(conn: &Connection, user_id: i64) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT a.code FROM user_achievements ua
         JOIN achievements a ON a.id = ua.achievement_id
         WHERE ua.user_id = ?1",
    )?;
    let codes = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<Result<HashSet<String>, _>>()?;
    Ok(codes)
}

/// Award `code` to a user if not already awarded.
///
/// Returns true when a new award row was written. Unknown codes are ignored.
pub fn award(conn: &Connection, user_id: i64, code: &str) -> Result<bool, AppError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id)
         SELECT ?1, id FROM achievements WHERE code = ?2",
        params![user_id, code],
    )?;
    if inserted > 0 {
        info!(user_id, code, "Achievement awarded");
    } else {
        debug!(user_id, code, "Achievement already awarded or unknown");
    }
    Ok(inserted > 0)
}

/// Earned achievements, most recent first
pub fn earned_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<EarnedAchievement>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT a.code, a.title, a.description, a.icon, ua.earned_at
         FROM user_achievements ua
         JOIN achievements a ON a.id = ua.achievement_id
         WHERE ua.user_id = ?1
         ORDER BY ua.earned_at DESC, ua.id DESC",
    )?;
    let earned = stmt
        .query_map([user_id], |row| {
            Ok(EarnedAchievement {
                code: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                icon: row.get(3)?,
                earned_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(earned)
}

/// Full catalog with the user's earned flags, ordered by requirement
pub fn catalog_for_user(conn: &Connection, user_id: i64) -> Result<Vec<CatalogEntry>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT a.id, a.code, a.title, a.description, a.icon, a.requirement,
                ua.earned_at IS NOT NULL AS earned, ua.earned_at
         FROM achievements a
         LEFT JOIN user_achievements ua ON ua.achievement_id = a.id AND ua.user_id = ?1
         ORDER BY a.requirement, a.id",
    )?;
    let entries = stmt
        .query_map([user_id], CatalogEntry::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
