//! Request validation
//!
//! Turns loosely-typed request bodies into checked inputs before they reach
//! storage or the gamification engine.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, FieldError};

pub const DEFAULT_EMOJI: &str = "📌";
pub const DEFAULT_GOAL_DAYS: u32 = 30;

const MAX_TITLE: usize = 255;
const MAX_DESCRIPTION: usize = 1000;
const MAX_EMOJI: usize = 10;
const GOAL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=365;

/// Body of `POST /api/habits` and `PUT /api/habits/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub goal_days: Option<i64>,
}

/// Checked input for a new habit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub emoji: String,
    pub goal_days: u32,
}

/// Checked partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the description (sent as an empty string)
    pub description: Option<Option<String>>,
    pub emoji: Option<String>,
    pub goal_days: Option<u32>,
}

impl HabitRequest {
    /// Validate as a creation request, applying defaults
    pub fn into_new_habit(self) -> Result<NewHabit, AppError> {
        let mut errors = Vec::new();
        if self.title.is_none() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        let update = self.check(&mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NewHabit {
            title: update.title.unwrap_or_default(),
            description: update.description.flatten(),
            emoji: update.emoji.unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            goal_days: update.goal_days.unwrap_or(DEFAULT_GOAL_DAYS),
        })
    }

    /// Validate as a partial update
    pub fn into_update(self) -> Result<HabitUpdate, AppError> {
        let mut errors = Vec::new();
        let update = self.check(&mut errors);
        if errors.is_empty() {
            Ok(update)
        } else {
            Err(AppError::Validation(errors))
        }
    }

    fn check(self, errors: &mut Vec<FieldError>) -> HabitUpdate {
        if let Some(title) = &self.title {
            let len = title.chars().count();
            if title.trim().is_empty() {
                errors.push(FieldError::new("title", "Title is required"));
            } else if len > MAX_TITLE {
                errors.push(FieldError::new(
                    "title",
                    format!("Title must be at most {} characters", MAX_TITLE),
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION {
                errors.push(FieldError::new(
                    "description",
                    format!("Description must be at most {} characters", MAX_DESCRIPTION),
                ));
            }
        }
        if let Some(emoji) = &self.emoji {
            if emoji.chars().count() > MAX_EMOJI {
                errors.push(FieldError::new(
                    "emoji",
                    format!("Emoji must be at most {} characters", MAX_EMOJI),
                ));
            }
        }
        let goal_days = match self.goal_days {
            Some(days) if GOAL_DAYS_RANGE.contains(&days) => Some(days as u32),
            Some(_) => {
                errors.push(FieldError::new("goal_days", "Goal must be between 1 and 365 days"));
                None
            }
            None => None,
        };

        HabitUpdate {
            title: self.title,
            description: self.description.map(|d| Some(d).filter(|d| !d.is_empty())),
            emoji: self.emoji.filter(|e| !e.is_empty()),
            goal_days,
        }
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    let well_formed = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    let invalid = || AppError::Validation(vec![FieldError::new("date", "Date format: YYYY-MM-DD")]);
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

/// Check a calendar month path segment pair
pub fn check_month(year: i32, month: u32) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if !(1..=9999).contains(&year) {
        errors.push(FieldError::new("year", "Year must be between 1 and 9999"));
    }
    if !(1..=12).contains(&month) {
        errors.push(FieldError::new("month", "Month must be between 1 and 12"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
