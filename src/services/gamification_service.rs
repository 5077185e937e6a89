//! Gamification service - achievements and profile
//!
//! Achievements are re-evaluated from live data after every mutation and
//! awarded insert-if-absent, so calling `check_and_award` redundantly is
//! always safe.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Transaction;
use tracing::info;

use crate::db::{achievements, completions, habits, users, Database};
use crate::error::AppError;
use crate::gamification::{
    build_profile, calculate_streak, default_definitions, evaluate, GamificationConfig,
    HabitFacts, LevelCurve, Profile, UserFacts,
};

pub struct GamificationService {
    db: Arc<Database>,
    config: GamificationConfig,
    curve: LevelCurve,
}

impl GamificationService {
    pub fn new(db: Arc<Database>, config: GamificationConfig) -> Self {
        let curve = config.level_curve();
        Self { db, config, curve }
    }

    pub fn config(&self) -> &GamificationConfig {
        &self.config
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Seed the reference catalog (insert-if-absent)
    pub fn seed_catalog(&self) -> Result<usize, AppError> {
        let definitions = default_definitions();
        self.db
            .with_conn_mut(|conn| achievements::seed_definitions(conn, &definitions))
    }

    /// Evaluate every rule for a user and award newly met achievements.
    ///
    /// Returns the codes awarded by this call.
    pub fn check_and_award(&self, user_id: i64, today: NaiveDate) -> Result<Vec<String>, AppError> {
        let awarded = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let awarded = self.award_pending(&tx, user_id, today)?;
            tx.commit()?;
            Ok(awarded)
        })?;

        log_awards(user_id, &awarded);
        Ok(awarded)
    }

    /// Award achievements inside the caller's transaction.
    ///
    /// Used by mutations so that the change and its awards commit together.
    pub(crate) fn award_pending(
        &self,
        tx: &Transaction,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<String>, AppError> {
        let facts = gather_facts(tx, user_id, today)?;
        let definitions = achievements::definitions(tx)?;
        let earned = achievements::earned_codes(tx, user_id)?;

        let mut awarded = Vec::new();
        for code in evaluate(&self.config.rules, &facts, &definitions, &earned) {
            if achievements::award(tx, user_id, &code)? {
                awarded.push(code);
            }
        }
        Ok(awarded)
    }

    /// Level, progress and earned achievements
    pub fn profile(&self, user_id: i64) -> Result<Profile, AppError> {
        let (stats, earned) = self.db.with_conn(|conn| {
            Ok((
                users::get_stats(conn, user_id)?,
                achievements::earned_for_user(conn, user_id)?,
            ))
        })?;

        Ok(build_profile(
            &self.curve,
            stats.experience,
            stats.total_completions,
            earned,
        ))
    }

    /// Full catalog with earned flags
    pub fn catalog(&self, user_id: i64) -> Result<Vec<achievements::CatalogEntry>, AppError> {
        self.db.with_conn(|conn| achievements::catalog_for_user(conn, user_id))
    }
}

pub(crate) fn log_awards(user_id: i64, awarded: &[String]) {
    if !awarded.is_empty() {
        info!(user_id, codes = ?awarded, "New achievements");
    }
}

/// Snapshot of what the achievement rules look at
fn gather_facts(
    conn: &rusqlite::Connection,
    user_id: i64,
    today: NaiveDate,
) -> Result<UserFacts, AppError> {
    let ids = habits::habit_ids(conn, user_id)?;
    let mut per_habit = Vec::with_capacity(ids.len());

    for habit_id in ids {
        let dates = completions::dates_for_habit(conn, habit_id)?;
        per_habit.push(HabitFacts {
            completions: dates.len() as u32,
            streak: calculate_streak(dates, today),
        });
    }

    let stats = users::get_stats(conn, user_id)?;
    Ok(UserFacts {
        habit_count: per_habit.len() as u32,
        habits: per_habit,
        total_completions: u32::try_from(stats.total_completions).unwrap_or(u32::MAX),
    })
}
