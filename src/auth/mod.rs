//! Authentication
//!
//! Provides:
//! - Telegram Mini App initData verification
//! - JWT session tokens (HS256)
//! - `AuthUser` extractor for protected routes

pub mod jwt;
pub mod telegram;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub use jwt::{extract_token_from_header, extract_token_from_query, Claims, JwtValidator};
pub use telegram::{InitDataValidator, TelegramUser};

use crate::api::AppState;
use crate::error::AppError;

/// Authenticated caller, taken from a bearer token or `?token=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub telegram_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = extract_token_from_header(header)
            .map(str::to_string)
            .or_else(|| parts.uri.query().and_then(|q| extract_token_from_query(q, "token")))
            .ok_or_else(|| AppError::Unauthorized("Authorization required".into()))?;

        let claims = state.jwt.verify_token(&token)?;
        Ok(Self {
            user_id: claims.user_id,
            telegram_id: claims.telegram_id,
        })
    }
}
