//! Food Item model
//!
//! A nutrient-density record: energy and macros per 100 g.

use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::round_to;
use super::Nutrition;

/// Where a food item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodSource {
    #[default]
    Manual,
    OpenFoodFacts,
}

impl FoodSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodSource::Manual => "manual",
            FoodSource::OpenFoodFacts => "openfoodfacts",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openfoodfacts" => FoodSource::OpenFoodFacts,
            _ => FoodSource::Manual,
        }
    }
}

/// A food item with per-100g nutrient densities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub brand: String,
    pub per_100g: Nutrition,
    pub source: FoodSource,
    pub external_id: String,
    pub created_at: String,
}

/// Data for creating a manual food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub user_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub kcal_per_100g: f64,
    #[serde(default)]
    pub protein_per_100g: f64,
    #[serde(default)]
    pub fat_per_100g: f64,
    #[serde(default)]
    pub carb_per_100g: f64,
}

/// Densities written by a catalog import
#[derive(Debug, Clone)]
pub struct FoodItemImport {
    pub external_id: String,
    pub name: String,
    pub brand: String,
    pub per_100g: Nutrition,
}

impl FoodItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            per_100g: Nutrition {
                kcal: row.get("kcal_per_100g")?,
                protein: row.get("protein_per_100g")?,
                fat: row.get("fat_per_100g")?,
                carb: row.get("carb_per_100g")?,
            },
            source: FoodSource::from_str(row.get::<_, String>("source")?.as_str()),
            external_id: row.get("external_id")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a manual food item
    pub fn create(conn: &Connection, data: &FoodItemCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO food_items (
                user_id, name, brand,
                kcal_per_100g, protein_per_100g, fat_per_100g, carb_per_100g,
                source
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.user_id,
                data.name,
                data.brand,
                round_to(data.kcal_per_100g, 2),
                round_to(data.protein_per_100g, 2),
                round_to(data.fat_per_100g, 2),
                round_to(data.carb_per_100g, 2),
                FoodSource::Manual.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Insert or refresh a shared catalog item keyed on (source, external_id).
    /// Returns the item and whether it was newly created.
    pub fn upsert_from_catalog(conn: &mut Connection, data: &FoodItemImport) -> DbResult<(Self, bool)> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existed: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM food_items WHERE source = ?1 AND external_id = ?2)",
            params![FoodSource::OpenFoodFacts.as_str(), data.external_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO food_items (
                user_id, name, brand,
                kcal_per_100g, protein_per_100g, fat_per_100g, carb_per_100g,
                source, external_id
            ) VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(source, external_id) WHERE external_id <> '' DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                kcal_per_100g = excluded.kcal_per_100g,
                protein_per_100g = excluded.protein_per_100g,
                fat_per_100g = excluded.fat_per_100g,
                carb_per_100g = excluded.carb_per_100g
            "#,
            params![
                data.name,
                data.brand,
                round_to(data.per_100g.kcal, 2),
                round_to(data.per_100g.protein, 2),
                round_to(data.per_100g.fat, 2),
                round_to(data.per_100g.carb, 2),
                FoodSource::OpenFoodFacts.as_str(),
                data.external_id,
            ],
        )?;

        let item = tx.query_row(
            "SELECT * FROM food_items WHERE source = ?1 AND external_id = ?2",
            params![FoodSource::OpenFoodFacts.as_str(), data.external_id],
            Self::from_row,
        )?;
        tx.commit()?;

        Ok((item, !existed))
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a food item the user may log: shared items or their own
    pub fn get_visible(conn: &Connection, user_id: i64, id: i64) -> DbResult<Option<Self>> {
        Ok(Self::get_by_id(conn, id)?
            .filter(|item| item.user_id.map_or(true, |owner| owner == user_id)))
    }

    /// Search shared and own food items by name or brand
    pub fn search(conn: &Connection, user_id: i64, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_items
            WHERE (user_id IS NULL OR user_id = ?1)
              AND (name LIKE ?2 OR brand LIKE ?2)
            ORDER BY name ASC
            LIMIT ?3
            "#,
        )?;

        let items = stmt
            .query_map(params![user_id, search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// List shared and own food items ordered by name
    pub fn list(conn: &Connection, user_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_items
            WHERE user_id IS NULL OR user_id = ?1
            ORDER BY name ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let items = stmt
            .query_map(params![user_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count food items visible to a user
    pub fn count_visible(conn: &Connection, user_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM food_items WHERE user_id IS NULL OR user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::User;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn import(code: &str, kcal: f64) -> FoodItemImport {
        FoodItemImport {
            external_id: code.to_string(),
            name: "Kefir".to_string(),
            brand: "Dairy".to_string(),
            per_100g: Nutrition { kcal, protein: 3.0, fat: 1.0, carb: 4.0 },
        }
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let mut conn = setup();

        let (first, created) = FoodItem::upsert_from_catalog(&mut conn, &import("460", 40.0)).unwrap();
        assert!(created);
        assert_eq!(first.source, FoodSource::OpenFoodFacts);
        assert!(first.user_id.is_none());

        let (second, created) = FoodItem::upsert_from_catalog(&mut conn, &import("460", 52.456)).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.per_100g.kcal, 52.46);
    }

    #[test]
    fn test_manual_items_may_share_empty_external_id() {
        let conn = setup();
        let data = FoodItemCreate {
            user_id: None,
            name: "Rice".to_string(),
            brand: String::new(),
            kcal_per_100g: 130.0,
            protein_per_100g: 2.7,
            fat_per_100g: 0.3,
            carb_per_100g: 28.0,
        };
        FoodItem::create(&conn, &data).unwrap();
        FoodItem::create(&conn, &data).unwrap();
        assert_eq!(FoodItem::count_visible(&conn, 1).unwrap(), 2);
    }

    #[test]
    fn test_private_items_hidden_from_other_users() {
        let conn = setup();
        let (owner, _) = User::get_or_create(&conn, "owner").unwrap();
        let (other, _) = User::get_or_create(&conn, "other").unwrap();

        let item = FoodItem::create(&conn, &FoodItemCreate {
            user_id: Some(owner.id),
            name: "Grandma's pie".to_string(),
            brand: String::new(),
            kcal_per_100g: 300.0,
            protein_per_100g: 4.0,
            fat_per_100g: 15.0,
            carb_per_100g: 40.0,
        }).unwrap();

        assert!(FoodItem::get_visible(&conn, owner.id, item.id).unwrap().is_some());
        assert!(FoodItem::get_visible(&conn, other.id, item.id).unwrap().is_none());
        assert!(FoodItem::search(&conn, other.id, "pie", 10).unwrap().is_empty());
        assert_eq!(FoodItem::search(&conn, owner.id, "pie", 10).unwrap().len(), 1);
    }
}
