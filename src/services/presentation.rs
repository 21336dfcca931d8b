//! Display-side derivations over an analysis result.
//!
//! Two sets of macro baselines coexist here on purpose: the bar-chart
//! baselines in [`MacroTargets::DISPLAY`] (150 g / 200 g / 70 g) and the
//! daily goals in [`DailyGoals`] (120 g / 180 g / 50 g). They disagree and
//! are kept apart rather than reconciled.

use serde::Serialize;

use crate::models::{DailyGoalsComparison, GoalProgress, Macros, Nutrition};

/// Coarse calorie-keyed label shown next to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthLabel {
    Excellent,
    Good,
    Moderate,
    High,
}

impl HealthLabel {
    /// Buckets: `< 300`, `< 500`, `< 700`, everything else.
    pub fn for_calories(calories: u32) -> Self {
        if calories < 300 {
            HealthLabel::Excellent
        } else if calories < 500 {
            HealthLabel::Good
        } else if calories < 700 {
            HealthLabel::Moderate
        } else {
            HealthLabel::High
        }
    }

    pub fn score(&self) -> u8 {
        match self {
            HealthLabel::Excellent => 90,
            HealthLabel::Good => 75,
            HealthLabel::Moderate => 60,
            HealthLabel::High => 40,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthLabel::Excellent => "emerald",
            HealthLabel::Good => "green",
            HealthLabel::Moderate => "yellow",
            HealthLabel::High => "orange",
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthLabel::Excellent => "Excellent",
            HealthLabel::Good => "Good",
            HealthLabel::Moderate => "Moderate",
            HealthLabel::High => "High",
        };
        write!(f, "{}", s)
    }
}

/// Denominators for the macro bar chart, in grams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroTargets {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MacroTargets {
    pub const DISPLAY: MacroTargets = MacroTargets {
        protein: 150.0,
        carbs: 200.0,
        fats: 70.0,
    };
}

/// Percentages of each macro against a set of targets. Not capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MacroBreakdown {
    pub fn compute(macros: &Macros, targets: &MacroTargets) -> Self {
        Self {
            protein: percent(macros.protein as f64, targets.protein),
            carbs: percent(macros.carbs as f64, targets.carbs),
            fats: percent(macros.fats as f64, targets.fats),
        }
    }
}

fn percent(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        0.0
    } else {
        value / target * 100.0
    }
}

/// Daily goals shown on the dashboard and embedded in the analysis prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyGoals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    /// Litres.
    pub water: f64,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: 1800,
            protein: 120,
            carbs: 180,
            fat: 50,
            water: 2.5,
        }
    }
}

impl DailyGoals {
    /// How far one meal goes towards each daily goal. Percentages are
    /// rounded and not capped at 100.
    pub fn progress(&self, nutrition: &Nutrition) -> DailyGoalsComparison {
        let share = |consumed: f64, goal: u32| GoalProgress {
            consumed,
            goal: goal as f64,
            percentage: percent(consumed, goal as f64).round(),
        };
        DailyGoalsComparison {
            calories: share(nutrition.calories, self.calories),
            protein: share(nutrition.protein, self.protein),
            carbs: share(nutrition.carbs, self.carbs),
            fat: share(nutrition.fat, self.fat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_label_boundaries() {
        assert_eq!(HealthLabel::for_calories(0), HealthLabel::Excellent);
        assert_eq!(HealthLabel::for_calories(299), HealthLabel::Excellent);
        assert_eq!(HealthLabel::for_calories(299).score(), 90);
        assert_eq!(HealthLabel::for_calories(300), HealthLabel::Good);
        assert_eq!(HealthLabel::for_calories(300).score(), 75);
        assert_eq!(HealthLabel::for_calories(499), HealthLabel::Good);
        assert_eq!(HealthLabel::for_calories(500), HealthLabel::Moderate);
        assert_eq!(HealthLabel::for_calories(699), HealthLabel::Moderate);
        assert_eq!(HealthLabel::for_calories(699).score(), 60);
        assert_eq!(HealthLabel::for_calories(700), HealthLabel::High);
        assert_eq!(HealthLabel::for_calories(700).score(), 40);
    }

    #[test]
    fn test_macro_breakdown_uses_display_baselines() {
        let macros = Macros {
            protein: 30,
            carbs: 50,
            fats: 14,
        };
        let breakdown = MacroBreakdown::compute(&macros, &MacroTargets::DISPLAY);

        assert_eq!(breakdown.protein, 20.0);
        assert_eq!(breakdown.carbs, 25.0);
        assert_eq!(breakdown.fats, 20.0);
    }

    #[test]
    fn test_display_baselines_differ_from_daily_goals() {
        let goals = DailyGoals::default();
        assert_ne!(MacroTargets::DISPLAY.protein, goals.protein as f64);
        assert_ne!(MacroTargets::DISPLAY.carbs, goals.carbs as f64);
        assert_ne!(MacroTargets::DISPLAY.fats, goals.fat as f64);
    }

    #[test]
    fn test_daily_progress() {
        let nutrition = Nutrition {
            calories: 900.0,
            protein: 60.0,
            carbs: 45.0,
            fat: 60.0,
            ..Default::default()
        };
        let progress = DailyGoals::default().progress(&nutrition);

        assert_eq!(progress.calories.goal, 1800.0);
        assert_eq!(progress.calories.percentage, 50.0);
        assert_eq!(progress.protein.percentage, 50.0);
        assert_eq!(progress.carbs.percentage, 25.0);
        assert_eq!(progress.fat.consumed, 60.0);
        assert_eq!(progress.fat.percentage, 120.0);
    }

    #[test]
    fn test_label_colors() {
        assert_eq!(HealthLabel::Excellent.color(), "emerald");
        assert_eq!(HealthLabel::for_calories(650).color(), "yellow");
        assert_eq!(HealthLabel::High.to_string(), "High");
    }
}
