//! Gamification engine - levels, streaks and achievements
//!
//! Pure, synchronous computations shared by every caller:
//! - Level curve (experience -> level and back)
//! - Streak calculator (consecutive days ending at a reference date)
//! - Achievement evaluator (which codes are newly earned)
//! - Profile aggregator (display payload for the profile screen)
//!
//! Nothing in here touches storage or reads the system clock. "Today" is
//! always supplied by the caller.

pub mod achievements;
pub mod level;
pub mod profile;
pub mod streak;

use serde::{Deserialize, Serialize};

pub use achievements::{
    default_definitions, default_rules, evaluate, AchievementDefinition, AchievementRule,
    HabitFacts, RuleKind, UserFacts,
};
pub use level::LevelCurve;
pub use profile::{build_profile, EarnedAchievement, Profile};
pub use streak::calculate_streak;

/// Tuning for the level curve, experience rewards and achievement thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// XP needed to go from level 1 to level 2
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,

    /// Growth ratio between consecutive level costs
    #[serde(default = "default_growth_ratio")]
    pub growth_ratio: f64,

    /// XP granted per completion (and taken back when it is undone)
    #[serde(default = "default_xp_per_completion")]
    pub xp_per_completion: u64,

    /// Achievement thresholds
    #[serde(default = "default_rules")]
    pub rules: Vec<AchievementRule>,
}

fn default_base_xp() -> u64 { 100 }
fn default_growth_ratio() -> f64 { 1.5 }
fn default_xp_per_completion() -> u64 { 10 }

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            growth_ratio: default_growth_ratio(),
            xp_per_completion: default_xp_per_completion(),
            rules: default_rules(),
        }
    }
}

impl GamificationConfig {
    /// Level curve built from this configuration
    pub fn level_curve(&self) -> LevelCurve {
        LevelCurve::new(self.base_xp, self.growth_ratio)
    }
}
