//! Dashboard
//!
//! Two weeks of intake against the active goal, plus today's progress and
//! the weight forecast. Charts and reports are built from the same data.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::context::{Language, RequestContext, Theme};
use crate::db::{Database, DbResult};
use crate::error::AppResult;
use crate::models::{Goal, MealType, Nutrient, Nutrition, WeightLog};
use crate::nutrition::{daily_totals, forecast, series, DailyTotals, DailyValue, GoalProgress, WeightForecast};

/// Days shown, ending today
pub const WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Serialize)]
pub struct NutrientSeries {
    pub kcal: Vec<DailyValue>,
    pub protein: Vec<DailyValue>,
    pub fat: Vec<DailyValue>,
    pub carb: Vec<DailyValue>,
}

/// Localised captions
#[derive(Debug, Clone, Serialize)]
pub struct DashboardLabels {
    pub title: &'static str,
    pub kcal_per_day: &'static str,
    pub goal: &'static str,
    pub today: &'static str,
    pub latest_weight: &'static str,
    pub forecast: &'static str,
    pub no_goal: &'static str,
    pub meal_types: Vec<(MealType, &'static str)>,
}

impl DashboardLabels {
    pub fn new(language: Language) -> Self {
        let t = |ru: &'static str, en: &'static str| crate::context::tr(language, ru, en);
        Self {
            title: t("Дашборд", "Dashboard"),
            kcal_per_day: t("Ккал/день", "Kcal/day"),
            goal: t("Цель", "Goal"),
            today: t("Сегодня", "Today"),
            latest_weight: t("Последний вес", "Latest weight"),
            forecast: t("Прогноз веса", "Weight forecast"),
            no_goal: t("Цель не задана", "No goal set"),
            meal_types: MealType::ALL.iter().map(|m| (*m, m.label(language))).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub language: Language,
    pub theme: Theme,
    pub today: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub goal: Option<Goal>,
    pub days: Vec<DailyTotals>,
    pub series: NutrientSeries,
    pub today_totals: Nutrition,
    pub progress: Option<GoalProgress>,
    pub latest_weight: Option<WeightLog>,
    pub forecast: Option<WeightForecast>,
    pub labels: DashboardLabels,
}

/// Assemble the dashboard on an open connection
pub fn build_dashboard(conn: &Connection, ctx: &RequestContext, today: NaiveDate) -> DbResult<DashboardResponse> {
    let window_start = today - Duration::days(WINDOW_DAYS - 1);

    let goal = Goal::get_active(conn, ctx.user_id)?;
    let latest_weight = WeightLog::latest(conn, ctx.user_id)?;
    let days = daily_totals(conn, ctx.user_id, window_start, today)?;

    let today_totals = days.last().map(|d| d.nutrition).unwrap_or_default();
    let progress = goal.as_ref().map(|g| GoalProgress::from_goal(g, &today_totals));

    let forecast = goal.as_ref().and_then(|g| {
        let effective_start = g.start_date.max(window_start);
        let actual_kcal: f64 = days
            .iter()
            .filter(|d| d.date >= effective_start)
            .map(|d| d.nutrition.kcal)
            .sum();
        forecast(g, latest_weight.is_some(), window_start, today, actual_kcal)
    });

    let series = NutrientSeries {
        kcal: series(&days, Nutrient::Kcal),
        protein: series(&days, Nutrient::Protein),
        fat: series(&days, Nutrient::Fat),
        carb: series(&days, Nutrient::Carb),
    };

    Ok(DashboardResponse {
        username: ctx.username.clone(),
        language: ctx.language,
        theme: ctx.theme,
        today,
        window_start,
        window_end: today,
        goal,
        days,
        series,
        today_totals,
        progress,
        latest_weight,
        forecast,
        labels: DashboardLabels::new(ctx.language),
    })
}

pub fn get_dashboard(db: &Database, ctx: &RequestContext, today: NaiveDate) -> AppResult<DashboardResponse> {
    Ok(db.with_conn(|conn| build_dashboard(conn, ctx, today))?)
}
