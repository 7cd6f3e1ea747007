//! Weight trend forecast
//!
//! Projects body weight from the cumulative difference between the goal's
//! calorie budget and what was actually eaten.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Goal;
use super::round_to;

/// Energy equivalent of one kilogram of body fat
pub const KCAL_PER_KG: f64 = 7700.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightForecast {
    pub predicted_weight_kg: f64,
    pub weight_change_kg: f64,
    pub deficit_kcal: f64,
    pub days_count: i64,
    pub effective_start: NaiveDate,
}

/// Forecast weight at `today`.
///
/// `actual_kcal` is the logged total from `max(goal.start_date, window_start)`
/// through `today`. Returns `None` unless the goal has a start weight and the
/// user has at least one weight log, or when the goal starts after `today`.
pub fn forecast(
    goal: &Goal,
    has_weight_log: bool,
    window_start: NaiveDate,
    today: NaiveDate,
    actual_kcal: f64,
) -> Option<WeightForecast> {
    if !has_weight_log {
        return None;
    }
    let start_weight = goal.start_weight_kg?;

    let effective_start = goal.start_date.max(window_start);
    if effective_start > today {
        return None;
    }

    let days_count = (today - effective_start).num_days() + 1;
    let expected_kcal = goal.daily_kcal_target as f64 * days_count as f64;
    let deficit = expected_kcal - actual_kcal;
    let change = deficit / KCAL_PER_KG;

    Some(WeightForecast {
        predicted_weight_kg: round_to(start_weight - change, 2),
        weight_change_kg: round_to(change, 2),
        deficit_kcal: round_to(deficit, 0),
        days_count,
        effective_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn goal(start: NaiveDate, start_weight: Option<f64>) -> Goal {
        Goal {
            id: 1,
            user_id: 1,
            start_date: start,
            target_date: None,
            start_weight_kg: start_weight,
            target_weight_kg: Some(75.0),
            daily_kcal_target: 2000,
            daily_protein_target: None,
            daily_fat_target: None,
            daily_carb_target: None,
            is_active: true,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_forecast_arithmetic() {
        let g = goal(d(3, 1), Some(80.0));
        let f = forecast(&g, true, d(2, 20), d(3, 10), 14_300.0).unwrap();

        assert_eq!(f.effective_start, d(3, 1));
        assert_eq!(f.days_count, 10);
        // 20000 expected - 14300 eaten
        assert_eq!(f.deficit_kcal, 5700.0);
        assert_eq!(f.weight_change_kg, 0.74);
        assert_eq!(f.predicted_weight_kg, 79.26);
    }

    #[test]
    fn test_window_start_bounds_old_goals() {
        let g = goal(d(1, 1), Some(90.0));
        let f = forecast(&g, true, d(3, 1), d(3, 14), 30_800.0).unwrap();

        assert_eq!(f.effective_start, d(3, 1));
        assert_eq!(f.days_count, 14);
        // surplus of 2800 kcal
        assert_eq!(f.deficit_kcal, -2800.0);
        assert_eq!(f.weight_change_kg, -0.36);
        assert_eq!(f.predicted_weight_kg, 90.36);
    }

    #[test]
    fn test_absent_without_weight_log_or_start_weight() {
        assert!(forecast(&goal(d(3, 1), Some(80.0)), false, d(3, 1), d(3, 5), 0.0).is_none());
        assert!(forecast(&goal(d(3, 1), None), true, d(3, 1), d(3, 5), 0.0).is_none());
    }

    #[test]
    fn test_absent_for_goal_starting_in_future() {
        assert!(forecast(&goal(d(4, 1), Some(80.0)), true, d(3, 1), d(3, 14), 0.0).is_none());
    }
}
