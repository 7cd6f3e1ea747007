//! Food Item Tools
//!
//! Manual food entry and lookup over shared plus the caller's own items.

use serde::Serialize;
use tracing::info;

use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{FoodItem, FoodItemCreate, FoodSource};
use super::{check_len, check_range, MAX_DECIMAL, MAX_TEXT_LEN};

/// Summary of a food item for list/search results
#[derive(Debug, Serialize)]
pub struct FoodItemSummary {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub kcal_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub carb_per_100g: f64,
    pub source: FoodSource,
    pub shared: bool,
}

impl From<&FoodItem> for FoodItemSummary {
    fn from(item: &FoodItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            brand: item.brand.clone(),
            kcal_per_100g: item.per_100g.kcal,
            protein_per_100g: item.per_100g.protein,
            fat_per_100g: item.per_100g.fat,
            carb_per_100g: item.per_100g.carb,
            source: item.source,
            shared: item.user_id.is_none(),
        }
    }
}

/// Response for add_food_item
#[derive(Debug, Serialize)]
pub struct AddFoodItemResponse {
    pub item: FoodItemSummary,
    pub created_at: String,
}

/// Response for search_food_items
#[derive(Debug, Serialize)]
pub struct SearchFoodItemsResponse {
    pub items: Vec<FoodItemSummary>,
    pub total: usize,
}

/// Response for list_food_items
#[derive(Debug, Serialize)]
pub struct ListFoodItemsResponse {
    pub items: Vec<FoodItemSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Add a manual food item owned by the caller
pub fn add_food_item(db: &Database, ctx: &RequestContext, data: FoodItemCreate) -> AppResult<AddFoodItemResponse> {
    let name = data.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name", ctx.tr("название не может быть пустым", "cannot be empty")));
    }
    check_len("name", &name, MAX_TEXT_LEN)?;
    let brand = data.brand.trim().to_string();
    check_len("brand", &brand, MAX_TEXT_LEN)?;

    check_range("kcal_per_100g", data.kcal_per_100g, 0.0, false, MAX_DECIMAL)?;
    check_range("protein_per_100g", data.protein_per_100g, 0.0, false, MAX_DECIMAL)?;
    check_range("fat_per_100g", data.fat_per_100g, 0.0, false, MAX_DECIMAL)?;
    check_range("carb_per_100g", data.carb_per_100g, 0.0, false, MAX_DECIMAL)?;

    let data = FoodItemCreate {
        user_id: Some(ctx.user_id),
        name,
        brand,
        ..data
    };

    let item = db.with_conn(|conn| FoodItem::create(conn, &data))?;
    info!(user_id = ctx.user_id, food_item_id = item.id, "Food item added");

    Ok(AddFoodItemResponse {
        created_at: item.created_at.clone(),
        item: FoodItemSummary::from(&item),
    })
}

/// Search food items by name or brand
pub fn search_food_items(db: &Database, ctx: &RequestContext, query: &str, limit: i64) -> AppResult<SearchFoodItemsResponse> {
    let limit = limit.clamp(1, 100);
    let items = db.with_conn(|conn| FoodItem::search(conn, ctx.user_id, query.trim(), limit))?;

    let items: Vec<FoodItemSummary> = items.iter().map(FoodItemSummary::from).collect();
    let total = items.len();
    Ok(SearchFoodItemsResponse { items, total })
}

/// List food items with pagination
pub fn list_food_items(db: &Database, ctx: &RequestContext, limit: i64, offset: i64) -> AppResult<ListFoodItemsResponse> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let (items, total) = db.with_conn(|conn| {
        let items = FoodItem::list(conn, ctx.user_id, limit, offset)?;
        let total = FoodItem::count_visible(conn, ctx.user_id)?;
        Ok((items, total))
    })?;

    Ok(ListFoodItemsResponse {
        items: items.iter().map(FoodItemSummary::from).collect(),
        total,
        limit,
        offset,
    })
}
