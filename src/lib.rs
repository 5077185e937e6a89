//! habit-tracker: backend for a Telegram Mini App habit tracker
//!
//! Users sign in with Telegram initData, keep a list of daily habits and
//! check them off. Every completion earns experience; levels, streaks and
//! achievements are derived from the completion history.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod gamification;
pub mod notifications;
pub mod services;
pub mod validation;

pub use error::{AppError, Result};
