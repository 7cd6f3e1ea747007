//! Daily aggregation
//!
//! Sums logged portions per calendar day and lays them over a gap-free day
//! scaffold, so charts and tables always get one row per day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::DbResult;
use crate::models::{MealItem, Nutrient, Nutrition, Portion};

/// All four nutrient totals for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub nutrition: Nutrition,
}

/// A single nutrient's total for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub total: f64,
}

/// Every date from `start` to `end` inclusive; empty when `start > end`
pub fn day_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Group portions by date and left-join onto the full day range.
///
/// Portions dated outside the range are ignored.
pub fn aggregate_daily(portions: &[Portion], start: NaiveDate, end: NaiveDate) -> Vec<DailyTotals> {
    let mut by_date: BTreeMap<NaiveDate, Nutrition> = BTreeMap::new();
    for portion in portions {
        let amount = portion.per_100g.for_portion(portion.grams);
        let entry = by_date.entry(portion.date).or_default();
        *entry = *entry + amount;
    }

    day_range(start, end)
        .map(|date| DailyTotals {
            date,
            nutrition: by_date.get(&date).copied().unwrap_or_default(),
        })
        .collect()
}

/// Project one nutrient out of the shared day scaffold
pub fn series(days: &[DailyTotals], nutrient: Nutrient) -> Vec<DailyValue> {
    days.iter()
        .map(|d| DailyValue {
            date: d.date,
            total: d.nutrition.get(nutrient),
        })
        .collect()
}

/// Load and aggregate a user's portions for `[start, end]`
pub fn daily_totals(conn: &Connection, user_id: i64, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<DailyTotals>> {
    if start > end {
        return Ok(Vec::new());
    }
    let portions = MealItem::portions_in_range(conn, user_id, start, end)?;
    Ok(aggregate_daily(&portions, start, end))
}

/// Per-day totals of one nutrient for a user over `[start, end]`
pub fn daily_series(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    nutrient: Nutrient,
) -> DbResult<Vec<DailyValue>> {
    Ok(series(&daily_totals(conn, user_id, start, end)?, nutrient))
}
