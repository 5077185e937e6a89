//! Gamification routes

use axum::{extract::State, Json};

use super::AppState;
use crate::auth::AuthUser;
use crate::db::achievements::CatalogEntry;
use crate::error::AppError;
use crate::gamification::Profile;

/// GET /api/gamification/profile
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.services.gamification.profile(auth.user_id)?))
}

/// GET /api/gamification/achievements
pub async fn achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    Ok(Json(state.services.gamification.catalog(auth.user_id)?))
}
