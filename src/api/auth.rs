//! Sign-in routes

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{json_body, AppState};
use crate::auth::AuthUser;
use crate::db::users;
use crate::error::{AppError, FieldError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramSignInRequest {
    #[serde(default)]
    pub init_data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramSignInResponse {
    pub token: String,
    pub user_id: i64,
}

/// POST /api/auth/telegram
pub async fn telegram_sign_in(
    State(state): State<AppState>,
    body: Result<Json<TelegramSignInRequest>, JsonRejection>,
) -> Result<Json<TelegramSignInResponse>, AppError> {
    let request = json_body(body)?;
    if request.init_data.is_empty() {
        return Err(AppError::Validation(vec![FieldError::new(
            "initData",
            "initData is required",
        )]));
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(format!("System time error: {}", e)))?
        .as_secs();
    let tg_user = state.init_data.validate(&request.init_data, now)?;

    let user_id = state
        .db
        .with_conn_mut(|conn| users::upsert_telegram_user(conn, &tg_user))?;
    let token = state.jwt.generate_token(user_id, tg_user.id)?;

    info!(user_id, telegram_id = tg_user.id, "User signed in");
    Ok(Json(TelegramSignInResponse { token, user_id }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: users::UserRow,
    pub level: u32,
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .db
        .with_conn(|conn| users::get_user_with_stats(conn, auth.user_id))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let level = state
        .services
        .gamification
        .curve()
        .level_from_experience(user.experience);

    Ok(Json(MeResponse { user, level }))
}
