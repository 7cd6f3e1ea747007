//! Meal model
//!
//! One eating occasion: a user's slot on a given date.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::context::Language;
use crate::db::DbResult;

/// Meal slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }

    /// Display label in the requested language
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (MealType::Breakfast, Language::Ru) => "Завтрак",
            (MealType::Lunch, Language::Ru) => "Обед",
            (MealType::Dinner, Language::Ru) => "Ужин",
            (MealType::Snack, Language::Ru) => "Перекус",
            (MealType::Breakfast, Language::En) => "Breakfast",
            (MealType::Lunch, Language::En) => "Lunch",
            (MealType::Dinner, Language::En) => "Dinner",
            (MealType::Snack, Language::En) => "Snack",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub created_at: String,
}

impl Meal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw_type: String = row.get("meal_type")?;
        let meal_type = MealType::from_str(&raw_type).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(0, raw_type.clone(), rusqlite::types::Type::Text)
        })?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            meal_type,
            created_at: row.get("created_at")?,
        })
    }

    /// Get or create the meal for (user, date, slot).
    ///
    /// The unique constraint decides the winner; a concurrent insert for the
    /// same slot turns into a no-op and both callers read the same row.
    pub fn get_or_create(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
        meal_type: MealType,
    ) -> DbResult<(Self, bool)> {
        let inserted = conn.execute(
            r#"
            INSERT INTO meals (user_id, date, meal_type)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, date, meal_type) DO NOTHING
            "#,
            params![user_id, date, meal_type.as_str()],
        )?;

        let meal = conn.query_row(
            "SELECT * FROM meals WHERE user_id = ?1 AND date = ?2 AND meal_type = ?3",
            params![user_id, date, meal_type.as_str()],
            Self::from_row,
        )?;

        Ok((meal, inserted > 0))
    }

    /// Meals for a user on one date, in slot order
    pub fn list_for_day(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE user_id = ?1 AND date = ?2",
        )?;

        let mut meals = stmt
            .query_map(params![user_id, date], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        meals.sort_by_key(|m| m.meal_type);

        Ok(meals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::User;

    #[test]
    fn test_get_or_create_reuses_slot() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let (user, _) = User::get_or_create(&conn, "u").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let (a, created_a) = Meal::get_or_create(&conn, user.id, date, MealType::Lunch).unwrap();
        let (b, created_b) = Meal::get_or_create(&conn, user.id, date, MealType::Lunch).unwrap();
        let (c, _) = Meal::get_or_create(&conn, user.id, date, MealType::Breakfast).unwrap();

        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);

        let meals = Meal::list_for_day(&conn, user.id, date).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_meal_type_parsing_and_labels() {
        assert_eq!(MealType::from_str(" Dinner "), Some(MealType::Dinner));
        assert_eq!(MealType::from_str("brunch"), None);
        assert_eq!(MealType::Breakfast.label(Language::En), "Breakfast");
        assert_eq!(MealType::Breakfast.label(Language::Ru), "Завтрак");
    }
}
