//! Tracking service - completion toggles, calendar and per-habit stats

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::gamification_service::log_awards;
use super::habit_service::not_found;
use super::GamificationService;
use crate::db::{completions, habits, Database};
use crate::error::AppError;
use crate::gamification::calculate_streak;
use crate::validation::check_month;

/// Length of the stats history window, in days before today
pub const HISTORY_WINDOW_DAYS: i64 = 30;

/// Result of `POST /api/tracking/:habitId/toggle`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    pub completed: bool,
    pub date: NaiveDate,
    pub new_achievements: Vec<String>,
}

/// Result of `GET /api/tracking/:habitId/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub streak: u32,
    /// Completion dates in the window, newest first
    pub history: Vec<NaiveDate>,
    pub total_in_period: usize,
}

pub struct TrackingService {
    db: Arc<Database>,
    gamification: Arc<GamificationService>,
}

impl TrackingService {
    pub fn new(db: Arc<Database>, gamification: Arc<GamificationService>) -> Self {
        Self { db, gamification }
    }

    /// Flip completion of a habit on `date` and re-check achievements.
    ///
    /// The toggle and any awards commit in one transaction.
    pub fn toggle(
        &self,
        user_id: i64,
        habit_id: i64,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<ToggleResult, AppError> {
        let xp = self.gamification.config().xp_per_completion;
        let (outcome, new_achievements) = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !habits::habit_exists(&tx, user_id, habit_id)? {
                return Err(not_found());
            }
            let outcome = completions::toggle_completion(&tx, user_id, habit_id, date, xp)?;
            let awarded = self.gamification.award_pending(&tx, user_id, today)?;
            tx.commit()?;
            Ok((outcome, awarded))
        })?;
        log_awards(user_id, &new_achievements);

        Ok(ToggleResult {
            completed: outcome.is_completed(),
            date,
            new_achievements,
        })
    }

    /// Completion dates of a habit within a calendar month
    pub fn calendar(
        &self,
        user_id: i64,
        habit_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<NaiveDate>, AppError> {
        check_month(year, month)?;
        self.db.with_conn(|conn| {
            if !habits::habit_exists(conn, user_id, habit_id)? {
                return Err(not_found());
            }
            completions::dates_in_month(conn, habit_id, year, month)
        })
    }

    /// Current streak and the recent completion history of a habit
    pub fn stats(
        &self,
        user_id: i64,
        habit_id: i64,
        today: NaiveDate,
    ) -> Result<HabitStats, AppError> {
        let since = today - Duration::days(HISTORY_WINDOW_DAYS);
        self.db.with_conn(|conn| {
            if !habits::habit_exists(conn, user_id, habit_id)? {
                return Err(not_found());
            }
            let all = completions::dates_for_habit(conn, habit_id)?;
            let history = completions::dates_since(conn, habit_id, since)?;

            Ok(HabitStats {
                streak: calculate_streak(all, today),
                total_in_period: history.len(),
                history,
            })
        })
    }
}
