//! Catalog tools
//!
//! Search OpenFoodFacts and import a product as a shared food item.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{is_barcode, CatalogClient, CatalogProduct};
use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{FoodItem, FoodItemImport, Nutrition};
use super::food_items::FoodItemSummary;
use super::{truncate_chars, MAX_TEXT_LEN};

/// Response for search_catalog
#[derive(Debug, Serialize)]
pub struct SearchCatalogResponse {
    pub query: String,
    pub products: Vec<CatalogProduct>,
    pub count: usize,
}

/// Response for import_catalog_product
#[derive(Debug, Serialize)]
pub struct ImportProductResponse {
    pub item: FoodItemSummary,
    pub created: bool,
    pub message: String,
}

pub fn search_catalog(client: &CatalogClient, query: &str, limit: usize) -> SearchCatalogResponse {
    let products = client.search(query, limit);
    SearchCatalogResponse {
        query: query.trim().to_string(),
        count: products.len(),
        products,
    }
}

/// Fetch a product by barcode and upsert it keyed on its code
pub fn import_catalog_product(
    db: &Database,
    client: &CatalogClient,
    ctx: &RequestContext,
    code: &str,
) -> AppResult<ImportProductResponse> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::validation("code", ctx.tr("Не передан код продукта.", "No product code given.")));
    }
    if !is_barcode(code) {
        return Err(AppError::validation(
            "code",
            ctx.tr("Код продукта должен состоять из цифр.", "Product code must contain digits only."),
        ));
    }

    let product = client
        .get_product(code)
        .map_err(|e| {
            warn!(code, error = %e, "Catalog product lookup failed");
            AppError::CatalogUnavailable(
                ctx.tr(
                    "Не удалось получить данные из OpenFoodFacts. Попробуйте позже.",
                    "Could not reach OpenFoodFacts. Please try again later.",
                )
                .to_string(),
            )
        })?
        .ok_or_else(|| {
            AppError::ProductNotFound(format!("{}: {}", ctx.tr("Продукт не найден", "Product not found"), code))
        })?;

    let Some(kcal) = product.kcal_100g else {
        return Err(AppError::MissingCalories(
            ctx.tr(
                "Не удалось импортировать продукт: нет данных по калорийности (на 100г).",
                "Cannot import product: no calorie data per 100 g.",
            )
            .to_string(),
        ));
    };

    let data = FoodItemImport {
        external_id: product.code.clone(),
        name: truncate_chars(&product.name, MAX_TEXT_LEN),
        brand: truncate_chars(&product.brand, MAX_TEXT_LEN),
        per_100g: Nutrition {
            kcal,
            protein: product.protein_100g.unwrap_or(0.0),
            fat: product.fat_100g.unwrap_or(0.0),
            carb: product.carbs_100g.unwrap_or(0.0),
        },
    };

    let (item, created) = db.with_conn_mut(|conn| FoodItem::upsert_from_catalog(conn, &data))?;
    info!(user_id = ctx.user_id, code, food_item_id = item.id, created, "Catalog product imported");

    let message = format!(
        "{}: {}",
        if created {
            ctx.tr("Продукт добавлен", "Product added")
        } else {
            ctx.tr("Продукт обновлён", "Product updated")
        },
        item.name
    );

    Ok(ImportProductResponse {
        item: FoodItemSummary::from(&item),
        created,
        message,
    })
}
