//! HTTP API
//!
//! Provides:
//! - Telegram sign-in and session tokens
//! - Habit CRUD
//! - Completion tracking, calendar and per-habit stats
//! - Gamification profile and achievement catalog
//! - Reminder settings

pub mod auth;
pub mod gamification;
pub mod habits;
pub mod notifications;
pub mod tracking;

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{InitDataValidator, JwtValidator};
use crate::clock::Clock;
use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::services::Services;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub services: Services,
    pub jwt: Arc<JwtValidator>,
    pub init_data: Arc<InitDataValidator>,
    pub clock: Clock,
}

impl AppState {
    /// Wire services and validators from configuration and seed the
    /// achievement catalog
    pub fn from_config(db: Arc<Database>, config: &Config, clock: Clock) -> Result<Self, AppError> {
        let jwt = match config.auth.jwt_secret.clone() {
            Some(secret) => JwtValidator::new(secret, config.auth.token_expiry_secs)?,
            None if config.auth.dev_mode => {
                tracing::warn!("JWT_SECRET not set, using the built-in dev secret");
                JwtValidator::new_dev(config.auth.token_expiry_secs)
            }
            None => {
                return Err(AppError::Config(
                    "JWT_SECRET is required outside dev mode".into(),
                ))
            }
        };

        let init_data = InitDataValidator::new(
            config.telegram.bot_token.clone(),
            config.auth.init_data_max_age_secs,
        );

        let services = Services::new(db.clone(), config.gamification.clone());
        let seeded = services.gamification.seed_catalog()?;
        tracing::debug!(seeded, "Achievement catalog ready");

        Ok(Self {
            db,
            services,
            jwt: Arc::new(jwt),
            init_data: Arc::new(init_data),
            clock,
        })
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Auth
        .route("/api/auth/telegram", post(auth::telegram_sign_in))
        .route("/api/auth/me", get(auth::me))
        // Habits
        .route("/api/habits", get(habits::list).post(habits::create))
        .route(
            "/api/habits/:id",
            get(habits::get_one).put(habits::update).delete(habits::delete),
        )
        // Tracking
        .route("/api/tracking/:habit_id/toggle", post(tracking::toggle))
        .route(
            "/api/tracking/:habit_id/calendar/:year/:month",
            get(tracking::calendar),
        )
        .route("/api/tracking/:habit_id/stats", get(tracking::stats))
        // Gamification
        .route("/api/gamification/profile", get(gamification::profile))
        .route("/api/gamification/achievements", get(gamification::achievements))
        // Notifications
        .route(
            "/api/notifications/settings",
            get(notifications::get_settings).put(notifications::update_settings),
        )
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Unwrap a JSON body, reporting malformed input in our error format
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Unwrap path parameters, reporting malformed segments in our error format
pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
