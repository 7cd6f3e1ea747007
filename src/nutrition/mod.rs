//! Nutrition calculation module
//!
//! Portion scaling, daily aggregation, goal progress and weight forecasting.

pub mod aggregate;
pub mod calculator;
pub mod forecast;
pub mod progress;

pub use aggregate::{aggregate_daily, daily_series, daily_totals, day_range, series, DailyTotals, DailyValue};
pub use calculator::{round_to, scale};
pub use forecast::{forecast, WeightForecast, KCAL_PER_KG};
pub use progress::{progress, GoalProgress};
