//! Meal logging tools
//!
//! Adds portions to the diary and reads a day back grouped by slot.

use chrono::NaiveDate;
use rusqlite::TransactionBehavior;
use serde::Serialize;
use tracing::info;

use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{FoodItem, Meal, MealItem, MealItemDetail, MealType, Nutrition};
use super::{check_range, MAX_DECIMAL};

/// Response for log_meal_item
#[derive(Debug, Serialize)]
pub struct LogMealItemResponse {
    pub meal_item_id: i64,
    pub meal_id: i64,
    pub meal_created: bool,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub meal_label: String,
    pub food_item_id: i64,
    pub food_name: String,
    pub grams: f64,
    pub nutrition: Nutrition,
    pub message: String,
}

/// One slot of a day
#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub meal_id: i64,
    pub meal_type: MealType,
    pub label: String,
    pub items: Vec<MealItemDetail>,
    pub totals: Nutrition,
}

/// Response for get_day
#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    pub meals: Vec<MealSummary>,
    pub totals: Nutrition,
}

/// Log a portion of a food item into (date, slot), creating the meal on
/// first use
pub fn log_meal_item(
    db: &Database,
    ctx: &RequestContext,
    date: NaiveDate,
    meal_type: MealType,
    food_item_id: i64,
    grams: f64,
) -> AppResult<LogMealItemResponse> {
    check_range("grams", grams, 0.0, true, MAX_DECIMAL)?;

    let mut conn = db.get_conn()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let food = FoodItem::get_visible(&tx, ctx.user_id, food_item_id)?.ok_or_else(|| {
        AppError::NotFound(format!(
            "{}: {}",
            ctx.tr("Продукт не найден", "Food item not found"),
            food_item_id
        ))
    })?;

    // meal and item commit together
    let (meal, meal_created) = Meal::get_or_create(&tx, ctx.user_id, date, meal_type)?;
    let item = MealItem::create(&tx, meal.id, food.id, grams)?;
    tx.commit()?;

    info!(
        user_id = ctx.user_id,
        meal_id = meal.id,
        food_item_id = food.id,
        grams = item.grams,
        "Meal item logged"
    );

    Ok(LogMealItemResponse {
        meal_item_id: item.id,
        meal_id: meal.id,
        meal_created,
        date,
        meal_type,
        meal_label: meal_type.label(ctx.language).to_string(),
        food_item_id: food.id,
        food_name: food.name,
        grams: item.grams,
        nutrition: food.per_100g.for_portion(item.grams),
        message: ctx.tr("Запись добавлена в дневник.", "Entry added to the diary.").to_string(),
    })
}

/// A day's meals in slot order with derived nutrition
pub fn get_day(db: &Database, ctx: &RequestContext, date: NaiveDate) -> AppResult<DayResponse> {
    let meals = db.with_conn(|conn| {
        let mut out = Vec::new();
        for meal in Meal::list_for_day(conn, ctx.user_id, date)? {
            let items = MealItem::details_for_meal(conn, meal.id)?;
            let totals: Nutrition = items.iter().map(|i| i.nutrition).sum();
            out.push(MealSummary {
                meal_id: meal.id,
                meal_type: meal.meal_type,
                label: meal.meal_type.label(ctx.language).to_string(),
                items,
                totals,
            });
        }
        Ok(out)
    })?;

    let totals = meals.iter().map(|m| m.totals).sum();
    Ok(DayResponse { date, meals, totals })
}
