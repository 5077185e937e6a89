//! Tracking routes

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{path_params, AppState};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::{HabitStats, ToggleResult};
use crate::validation::parse_date;

#[derive(Debug, Default, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub date: Option<String>,
}

/// POST /api/tracking/:habit_id/toggle
///
/// The body is optional; without a date the current local day is toggled.
pub async fn toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    habit_id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<ToggleResult>, AppError> {
    let habit_id = path_params(habit_id)?;
    let request: ToggleRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ToggleRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let today = state.clock.today();
    let date = match request.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let result = state
        .services
        .tracking
        .toggle(auth.user_id, habit_id, date, today)?;
    Ok(Json(result))
}

/// GET /api/tracking/:habit_id/calendar/:year/:month
pub async fn calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    params: Result<Path<(i64, i32, u32)>, PathRejection>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    let (habit_id, year, month) = path_params(params)?;
    let dates = state
        .services
        .tracking
        .calendar(auth.user_id, habit_id, year, month)?;
    Ok(Json(dates))
}

/// GET /api/tracking/:habit_id/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    habit_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<HabitStats>, AppError> {
    let habit_id = path_params(habit_id)?;
    let today = state.clock.today();
    Ok(Json(state.services.tracking.stats(auth.user_id, habit_id, today)?))
}
