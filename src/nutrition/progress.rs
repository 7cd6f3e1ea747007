//! Goal progress
//!
//! Compares today's totals against the active goal's daily targets.

use serde::Serialize;

use crate::models::{Goal, Nutrition};

/// Percentage of `target` reached by `today_total`, truncated toward zero
/// and clamped to `[0, 100]`. `None` when there is no positive target.
pub fn progress(today_total: f64, target: Option<f64>) -> Option<u8> {
    let target = target.filter(|t| *t > 0.0)?;
    let pct = (today_total / target * 100.0).trunc();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// Progress per nutrient for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct GoalProgress {
    pub kcal: Option<u8>,
    pub protein: Option<u8>,
    pub fat: Option<u8>,
    pub carb: Option<u8>,
}

impl GoalProgress {
    pub fn from_goal(goal: &Goal, today: &Nutrition) -> Self {
        Self {
            kcal: progress(today.kcal, Some(goal.daily_kcal_target as f64)),
            protein: progress(today.protein, goal.daily_protein_target.map(|t| t as f64)),
            fat: progress(today.fat, goal.daily_fat_target.map(|t| t as f64)),
            carb: progress(today.carb, goal.daily_carb_target.map(|t| t as f64)),
        }
    }
}
