//! Achievement evaluator
//!
//! Decides which achievement codes a user newly qualifies for. Evaluation
//! is stateless and meant to run after every mutation; awarding is
//! insert-if-absent at the storage layer, so redundant calls are harmless.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// What a rule measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Number of habits the user has
    HabitCount,
    /// Completions of any single habit, or the user's total
    Completions,
    /// Current streak of any single habit
    Streak,
}

/// Threshold rule for one achievement code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRule {
    pub code: String,
    pub kind: RuleKind,
    pub threshold: u32,
}

impl AchievementRule {
    pub fn new(code: impl Into<String>, kind: RuleKind, threshold: u32) -> Self {
        Self {
            code: code.into(),
            kind,
            threshold,
        }
    }

    /// Whether `facts` meet this rule
    pub fn is_met(&self, facts: &UserFacts) -> bool {
        match self.kind {
            RuleKind::HabitCount => facts.habit_count >= self.threshold,
            RuleKind::Completions => {
                facts.total_completions >= self.threshold
                    || facts.habits.iter().any(|h| h.completions >= self.threshold)
            }
            RuleKind::Streak => facts.habits.iter().any(|h| h.streak >= self.threshold),
        }
    }
}

/// Reference data for an achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub requirement: u32,
}

/// Per-habit facts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitFacts {
    pub completions: u32,
    pub streak: u32,
}

/// Per-user facts gathered by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFacts {
    pub habit_count: u32,
    pub habits: Vec<HabitFacts>,
    pub total_completions: u32,
}

/// Default thresholds
pub fn default_rules() -> Vec<AchievementRule> {
    vec![
        AchievementRule::new("first_habit", RuleKind::HabitCount, 1),
        AchievementRule::new("completions_10", RuleKind::Completions, 10),
        AchievementRule::new("completions_50", RuleKind::Completions, 50),
        AchievementRule::new("streak_7", RuleKind::Streak, 7),
        AchievementRule::new("streak_30", RuleKind::Streak, 30),
    ]
}

/// Reference catalog seeded into storage
pub fn default_definitions() -> Vec<AchievementDefinition> {
    let def = |code: &str, title: &str, description: &str, icon: &str, requirement: u32| {
        AchievementDefinition {
            code: code.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            requirement,
        }
    };

    vec![
        def("first_habit", "First step", "Create your first habit", "🌱", 1),
        def("completions_10", "Getting going", "Complete habits 10 times", "✅", 10),
        def("completions_50", "Dedicated", "Complete habits 50 times", "🏅", 50),
        def("streak_7", "One week strong", "Keep a habit for 7 days in a row", "🔥", 7),
        def("streak_30", "Unstoppable", "Keep a habit for 30 days in a row", "🏆", 30),
    ]
}

/// Codes whose rule is met, that have a definition, and are not yet earned.
///
/// Rules referring to codes without a definition are skipped silently.
/// Output follows rule order and never repeats a code.
pub fn evaluate(
    rules: &[AchievementRule],
    facts: &UserFacts,
    definitions: &[AchievementDefinition],
    earned: &HashSet<String>,
) -> Vec<String> {
    let known: HashSet<&str> = definitions.iter().map(|d| d.code.as_str()).collect();
    let mut newly = Vec::new();

    for rule in rules {
        if !known.contains(rule.code.as_str())
            || earned.contains(&rule.code)
            || newly.contains(&rule.code)
        {
            continue;
        }
        if rule.is_met(facts) {
            newly.push(rule.code.clone());
        }
    }

    newly
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit(completions: u32, streak: u32) -> HabitFacts {
        HabitFacts {
            completions,
            streak,
        }
    }

    fn run(facts: &UserFacts, earned: &[&str]) -> Vec<String> {
        let earned: HashSet<String> = earned.iter().map(|c| c.to_string()).collect();
        evaluate(&default_rules(), facts, &default_definitions(), &earned)
    }

    #[test]
    fn test_first_habit_only() {
        let facts = UserFacts {
            habit_count: 1,
            habits: vec![habit(0, 0)],
            total_completions: 0,
        };
        assert_eq!(run(&facts, &[]), vec!["first_habit"]);
    }

    #[test]
    fn test_no_habits_earns_nothing() {
        assert!(run(&UserFacts::default(), &[]).is_empty());
    }

    #[test]
    fn test_completions_via_aggregate() {
        let facts = UserFacts {
            habit_count: 2,
            habits: vec![habit(6, 0), habit(4, 0)],
            total_completions: 10,
        };
        let codes = run(&facts, &["first_habit"]);
        assert_eq!(codes, vec!["completions_10"]);
    }

    #[test]
    fn test_completions_via_single_habit() {
        // Total may lag behind per-habit counts after a habit is deleted
        let facts = UserFacts {
            habit_count: 1,
            habits: vec![habit(52, 0)],
            total_completions: 3,
        };
        let codes = run(&facts, &[]);
        assert_eq!(codes, vec!["first_habit", "completions_10", "completions_50"]);
    }

    #[test]
    fn test_streak_thresholds() {
        let facts = UserFacts {
            habit_count: 2,
            habits: vec![habit(7, 7), habit(3, 3)],
            total_completions: 10,
        };
        let codes = run(&facts, &["first_habit", "completions_10"]);
        assert_eq!(codes, vec!["streak_7"]);

        let facts = UserFacts {
            habit_count: 1,
            habits: vec![habit(30, 30)],
            total_completions: 30,
        };
        let codes = run(&facts, &["first_habit", "completions_10"]);
        assert_eq!(codes, vec!["streak_7", "streak_30"]);
    }

    #[test]
    fn test_earned_codes_are_not_repeated() {
        let facts = UserFacts {
            habit_count: 3,
            habits: vec![habit(10, 1)],
            total_completions: 10,
        };
        assert!(run(&facts, &["first_habit", "completions_10"]).is_empty());
    }

    #[test]
    fn test_unknown_codes_are_skipped() {
        let mut rules = default_rules();
        rules.push(AchievementRule::new("habits_5", RuleKind::HabitCount, 5));
        let facts = UserFacts {
            habit_count: 5,
            habits: Vec::new(),
            total_completions: 0,
        };
        let codes = evaluate(&rules, &facts, &default_definitions(), &HashSet::new());
        assert_eq!(codes, vec!["first_habit"]);
    }

    #[test]
    fn test_duplicate_rules_yield_one_code() {
        let rules = vec![
            AchievementRule::new("first_habit", RuleKind::HabitCount, 1),
            AchievementRule::new("first_habit", RuleKind::HabitCount, 1),
        ];
        let facts = UserFacts {
            habit_count: 1,
            ..Default::default()
        };
        let codes = evaluate(&rules, &facts, &default_definitions(), &HashSet::new());
        assert_eq!(codes, vec!["first_habit"]);
    }

    #[test]
    fn test_rule_kind_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            rules: Vec<AchievementRule>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
[[rules]]
code = "streak_7"
kind = "streak"
threshold = 7

[[rules]]
code = "first_habit"
kind = "habit_count"
threshold = 1
"#,
        )
        .unwrap();

        assert_eq!(parsed.rules[0].kind, RuleKind::Streak);
        assert_eq!(parsed.rules[1].kind, RuleKind::HabitCount);
    }
}
