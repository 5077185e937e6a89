//! Habit service - habit CRUD with streaks and achievement checks

use std::sync::Arc;

use chrono::NaiveDate;

use super::gamification_service::log_awards;
use super::GamificationService;
use crate::db::{completions, habits, Database};
use crate::error::AppError;
use crate::gamification::calculate_streak;
use crate::validation::HabitRequest;

pub struct HabitService {
    db: Arc<Database>,
    gamification: Arc<GamificationService>,
}

impl HabitService {
    pub fn new(db: Arc<Database>, gamification: Arc<GamificationService>) -> Self {
        Self { db, gamification }
    }

    /// All habits of a user with their current streaks
    pub fn list(&self, user_id: i64, today: NaiveDate) -> Result<Vec<habits::HabitRow>, AppError> {
        self.db.with_conn(|conn| {
            let mut rows = habits::list_habits(conn, user_id)?;
            for row in &mut rows {
                let dates = completions::dates_for_habit(conn, row.id)?;
                row.current_streak = calculate_streak(dates, today);
            }
            Ok(rows)
        })
    }

    pub fn get(
        &self,
        user_id: i64,
        habit_id: i64,
        today: NaiveDate,
    ) -> Result<habits::HabitRow, AppError> {
        self.db.with_conn(|conn| {
            let mut row = habits::get_habit(conn, user_id, habit_id)?.ok_or_else(not_found)?;
            let dates = completions::dates_for_habit(conn, row.id)?;
            row.current_streak = calculate_streak(dates, today);
            Ok(row)
        })
    }

    /// Validate and create a habit, then re-check achievements in the same
    /// transaction
    pub fn create(
        &self,
        user_id: i64,
        request: HabitRequest,
        today: NaiveDate,
    ) -> Result<(habits::HabitRow, Vec<String>), AppError> {
        let habit = request.into_new_habit()?;
        let (row, awarded) = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let row = habits::create_habit(&tx, user_id, &habit)?;
            let awarded = self.gamification.award_pending(&tx, user_id, today)?;
            tx.commit()?;
            Ok((row, awarded))
        })?;
        log_awards(user_id, &awarded);
        Ok((row, awarded))
    }

    pub fn update(
        &self,
        user_id: i64,
        habit_id: i64,
        request: HabitRequest,
        today: NaiveDate,
    ) -> Result<habits::HabitRow, AppError> {
        let update = request.into_update()?;
        self.db
            .with_conn(|conn| habits::update_habit(conn, user_id, habit_id, &update))?
            .ok_or_else(not_found)?;
        self.get(user_id, habit_id, today)
    }

    pub fn delete(&self, user_id: i64, habit_id: i64) -> Result<(), AppError> {
        if self.db.with_conn(|conn| habits::delete_habit(conn, user_id, habit_id))? {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Habit not found".into())
}
