//! Service layer
//!
//! Services sit between the HTTP handlers and the repository functions in
//! `db/`. They own transaction boundaries, call into the gamification
//! engine, and receive "today" from the caller.
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Service Layer (business logic)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod gamification_service;
pub mod habit_service;
pub mod tracking_service;

pub use gamification_service::GamificationService;
pub use habit_service::HabitService;
pub use tracking_service::{HabitStats, ToggleResult, TrackingService};

use std::sync::Arc;

use crate::db::Database;
use crate::gamification::GamificationConfig;

/// Service container shared by the HTTP layer
#[derive(Clone)]
pub struct Services {
    pub habits: Arc<HabitService>,
    pub tracking: Arc<TrackingService>,
    pub gamification: Arc<GamificationService>,
}

impl Services {
    pub fn new(db: Arc<Database>, config: GamificationConfig) -> Self {
        let gamification = Arc::new(GamificationService::new(db.clone(), config));
        Self {
            habits: Arc::new(HabitService::new(db.clone(), gamification.clone())),
            tracking: Arc::new(TrackingService::new(db, gamification.clone())),
            gamification,
        }
    }
}
