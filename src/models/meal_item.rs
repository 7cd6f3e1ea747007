//! Meal Item model
//!
//! A portion of one food item inside a meal. Nutrition is derived from the
//! food item's densities on read and never stored.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::round_to;
use super::Nutrition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItem {
    pub id: i64,
    pub meal_id: i64,
    pub food_item_id: i64,
    pub grams: f64,
    pub created_at: String,
}

/// Meal item joined with its food item, with derived amounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItemDetail {
    pub id: i64,
    pub meal_id: i64,
    pub food_item_id: i64,
    pub food_name: String,
    pub brand: String,
    pub grams: f64,
    pub nutrition: Nutrition,
}

/// One logged portion with the date of its meal, as fed to the aggregator
#[derive(Debug, Clone, Copy)]
pub struct Portion {
    pub date: NaiveDate,
    pub grams: f64,
    pub per_100g: Nutrition,
}

impl MealItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            meal_id: row.get("meal_id")?,
            food_item_id: row.get("food_item_id")?,
            grams: row.get("grams")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, meal_id: i64, food_item_id: i64, grams: f64) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO meal_items (meal_id, food_item_id, grams) VALUES (?1, ?2, ?3)",
            params![meal_id, food_item_id, round_to(grams, 2)],
        )?;

        let id = conn.last_insert_rowid();
        let item = conn.query_row(
            "SELECT * FROM meal_items WHERE id = ?1",
            [id],
            Self::from_row,
        )?;
        Ok(item)
    }

    /// Items of a meal with food names and derived nutrition
    pub fn details_for_meal(conn: &Connection, meal_id: i64) -> DbResult<Vec<MealItemDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT mi.id, mi.meal_id, mi.food_item_id, mi.grams,
                   f.name, f.brand,
                   f.kcal_per_100g, f.protein_per_100g, f.fat_per_100g, f.carb_per_100g
            FROM meal_items mi
            INNER JOIN food_items f ON f.id = mi.food_item_id
            WHERE mi.meal_id = ?1
            ORDER BY mi.id
            "#,
        )?;

        let items = stmt
            .query_map([meal_id], |row| {
                let grams: f64 = row.get("grams")?;
                let density = Nutrition {
                    kcal: row.get("kcal_per_100g")?,
                    protein: row.get("protein_per_100g")?,
                    fat: row.get("fat_per_100g")?,
                    carb: row.get("carb_per_100g")?,
                };
                Ok(MealItemDetail {
                    id: row.get("id")?,
                    meal_id: row.get("meal_id")?,
                    food_item_id: row.get("food_item_id")?,
                    food_name: row.get("name")?,
                    brand: row.get("brand")?,
                    grams,
                    nutrition: density.for_portion(grams),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Every portion a user logged between `start` and `end` inclusive
    pub fn portions_in_range(
        conn: &Connection,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Portion>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.date, mi.grams,
                   f.kcal_per_100g, f.protein_per_100g, f.fat_per_100g, f.carb_per_100g
            FROM meal_items mi
            INNER JOIN meals m ON m.id = mi.meal_id
            INNER JOIN food_items f ON f.id = mi.food_item_id
            WHERE m.user_id = ?1 AND m.date BETWEEN ?2 AND ?3
            "#,
        )?;

        let portions = stmt
            .query_map(params![user_id, start, end], |row| {
                Ok(Portion {
                    date: row.get("date")?,
                    grams: row.get("grams")?,
                    per_100g: Nutrition {
                        kcal: row.get("kcal_per_100g")?,
                        protein: row.get("protein_per_100g")?,
                        fat: row.get("fat_per_100g")?,
                        carb: row.get("carb_per_100g")?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(portions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{FoodItem, FoodItemCreate, Meal, MealType, User};

    #[test]
    fn test_details_derive_nutrition_from_density() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let (user, _) = User::get_or_create(&conn, "mi").unwrap();
        let food = FoodItem::create(&conn, &FoodItemCreate {
            user_id: Some(user.id),
            name: "Chicken breast".to_string(),
            brand: String::new(),
            kcal_per_100g: 165.0,
            protein_per_100g: 31.0,
            fat_per_100g: 3.6,
            carb_per_100g: 0.0,
        }).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let (meal, _) = Meal::get_or_create(&conn, user.id, day, MealType::Lunch).unwrap();

        let item = MealItem::create(&conn, meal.id, food.id, 150.004).unwrap();
        assert_eq!(item.grams, 150.0);

        let details = MealItem::details_for_meal(&conn, meal.id).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].food_name, "Chicken breast");
        assert!((details[0].nutrition.kcal - 247.5).abs() < 1e-9);
        assert!((details[0].nutrition.protein - 46.5).abs() < 1e-9);

        let portions = MealItem::portions_in_range(&conn, user.id, day, day).unwrap();
        assert_eq!(portions.len(), 1);
        assert!(MealItem::portions_in_range(&conn, user.id, day.succ_opt().unwrap(), day.succ_opt().unwrap())
            .unwrap()
            .is_empty());
    }
}
