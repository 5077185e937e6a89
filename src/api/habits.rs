//! Habit routes

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{json_body, path_params, AppState};
use crate::auth::AuthUser;
use crate::db::habits::HabitRow;
use crate::error::AppError;
use crate::validation::HabitRequest;

/// Created habit plus anything it unlocked
#[derive(Debug, Serialize)]
pub struct CreatedHabit {
    #[serde(flatten)]
    pub habit: HabitRow,
    #[serde(rename = "newAchievements")]
    pub new_achievements: Vec<String>,
}

/// GET /api/habits
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<HabitRow>>, AppError> {
    let today = state.clock.today();
    Ok(Json(state.services.habits.list(auth.user_id, today)?))
}

/// POST /api/habits
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<HabitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedHabit>), AppError> {
    let request = json_body(body)?;
    let today = state.clock.today();
    let (habit, new_achievements) = state.services.habits.create(auth.user_id, request, today)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedHabit {
            habit,
            new_achievements,
        }),
    ))
}

/// GET /api/habits/:id
pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<HabitRow>, AppError> {
    let id = path_params(id)?;
    let today = state.clock.today();
    Ok(Json(state.services.habits.get(auth.user_id, id, today)?))
}

/// PUT /api/habits/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<HabitRequest>, JsonRejection>,
) -> Result<Json<HabitRow>, AppError> {
    let id = path_params(id)?;
    let request = json_body(body)?;
    let today = state.clock.today();
    Ok(Json(state.services.habits.update(auth.user_id, id, request, today)?))
}

/// DELETE /api/habits/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_params(id)?;
    state.services.habits.delete(auth.user_id, id)?;
    Ok(Json(json!({ "success": true })))
}
