//! Reminder settings routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{json_body, AppState};
use crate::auth::AuthUser;
use crate::db::notifications;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
}

/// GET /api/notifications/settings
pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NotificationSettings>, AppError> {
    let enabled = state
        .db
        .with_conn(|conn| notifications::reminders_enabled(conn, auth.user_id))?;
    Ok(Json(NotificationSettings { enabled }))
}

/// PUT /api/notifications/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<NotificationSettings>, JsonRejection>,
) -> Result<Json<NotificationSettings>, AppError> {
    let settings = json_body(body)?;
    state.db.with_conn(|conn| {
        notifications::set_reminders_enabled(conn, auth.user_id, settings.enabled)
    })?;
    tracing::debug!(
        user_id = auth.user_id,
        enabled = settings.enabled,
        "Updated reminder settings"
    );
    Ok(Json(settings))
}
