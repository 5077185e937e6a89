//! Profile aggregator

use serde::{Deserialize, Serialize};

use super::level::LevelCurve;

/// An achievement the user has earned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedAchievement {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: String,
}

/// Profile payload for the gamification screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub level: u32,
    pub experience: u64,
    pub total_completions: u64,
    pub xp_to_next_level: u64,
    /// 0-100, rounded half away from zero
    pub progress_percent: u8,
    /// Most recent first
    pub achievements: Vec<EarnedAchievement>,
}

/// Combine experience and earned achievements into a profile.
///
/// `achievements` must already be ordered most recent first.
pub fn build_profile(
    curve: &LevelCurve,
    experience: u64,
    total_completions: u64,
    achievements: Vec<EarnedAchievement>,
) -> Profile {
    let level = curve.level_from_experience(experience);
    let xp_in_level = experience.saturating_sub(curve.xp_to_reach_level(level));
    let xp_needed = curve.xp_for_level(level);

    let progress = if xp_needed > 0 {
        (xp_in_level as f64 / xp_needed as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    Profile {
        level,
        experience,
        total_completions,
        xp_to_next_level: xp_needed.saturating_sub(xp_in_level),
        progress_percent: progress.round().clamp(0.0, 100.0) as u8,
        achievements,
    }
}
