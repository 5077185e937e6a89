//! SQLite persistence
//!
//! ## Tables
//!
//! - `users` - Telegram identities
//! - `user_stats` - experience and lifetime completion count per user
//! - `notification_settings` - daily reminder opt-in per user
//! - `habits` - habits owned by a user
//! - `habit_completions` - one row per (habit, calendar date)
//! - `achievements` - reference catalog
//! - `user_achievements` - awards, at most one per (user, achievement)
//!
//! Levels are never stored; they are derived from experience on read.

pub mod achievements;
pub mod completions;
pub mod habits;
pub mod notifications;
pub mod schema;
pub mod users;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::AppError;

/// SQLite database shared by all request handlers
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Internal(format!("creating {}: {}", parent.display(), e)))?;
        }
        info!(path = %path.display(), "Opening SQLite database");

        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open SQLite: {}", e)))?;

        // WAL for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| AppError::Database(format!("Failed to set PRAGMA: {}", e)))?;

        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, AppError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open in-memory SQLite: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read-only operation
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AppError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run a write operation with exclusive access
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| AppError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
