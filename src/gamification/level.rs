//! Level curve
//!
//! The cost of each level grows geometrically: reaching level 2 costs
//! `base_xp`, the next level costs `base_xp * ratio`, and so on. The
//! cumulative threshold for level `L` is the closed-form geometric sum
//! `floor(base * (ratio^(L-1) - 1) / (ratio - 1))`.

/// Geometric level curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCurve {
    base_xp: u64,
    growth_ratio: f64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::new(100, 1.5)
    }
}

impl LevelCurve {
    pub fn new(base_xp: u64, growth_ratio: f64) -> Self {
        debug_assert!(base_xp > 0, "base_xp must be positive");
        debug_assert!(growth_ratio > 1.0, "growth_ratio must be greater than 1");
        Self {
            base_xp,
            growth_ratio,
        }
    }

    /// Total experience needed to reach `level` (0 for level 1 and below)
    pub fn xp_to_reach_level(&self, level: u32) -> u64 {
        if level <= 1 {
            return 0;
        }
        let exponent = (level - 1) as f64;
        let total = self.base_xp as f64 * (self.growth_ratio.powf(exponent) - 1.0)
            / (self.growth_ratio - 1.0);
        // `as` saturates at u64::MAX for huge levels
        total.floor() as u64
    }

    /// Highest level whose threshold does not exceed `xp`
    pub fn level_from_experience(&self, xp: u64) -> u32 {
        let mut level = 1u32;
        let mut current = self.xp_to_reach_level(level);
        loop {
            let next = self.xp_to_reach_level(level + 1);
            // Past the f64 range the curve flattens; stop instead of spinning
            if next > xp || next <= current {
                return level;
            }
            level += 1;
            current = next;
        }
    }

    /// Cost of going from `level` to `level + 1`
    pub fn xp_for_level(&self, level: u32) -> u64 {
        self.xp_to_reach_level(level + 1)
            .saturating_sub(self.xp_to_reach_level(level))
    }
}
