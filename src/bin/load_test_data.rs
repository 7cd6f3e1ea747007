//! Utility to seed two weeks of sample diary data for an existing user
//!
//! Usage: load_test_data [username]   (defaults to "testuser")

use chrono::{Duration, Local};

use fitmacro::db::Database;
use fitmacro::models::{FoodItem, FoodItemCreate, Goal, GoalCreate, Meal, MealItem, MealType, User, WeightLog};

/// Shared foods: name, kcal, protein, fat, carbs per 100 g
const FOODS: [(&str, f64, f64, f64, f64); 6] = [
    ("Овсянка", 352.0, 12.3, 6.1, 59.5),
    ("Куриная грудка", 113.0, 23.6, 1.9, 0.4),
    ("Гречка отварная", 110.0, 4.2, 1.1, 21.3),
    ("Творог 5%", 121.0, 17.2, 5.0, 1.8),
    ("Яблоко", 47.0, 0.4, 0.4, 9.8),
    ("Banana", 89.0, 1.1, 0.3, 22.8),
];

/// (meal slot, food index, grams) eaten every day, with a small daily wobble
const MENU: [(MealType, usize, f64); 6] = [
    (MealType::Breakfast, 0, 60.0),
    (MealType::Breakfast, 5, 120.0),
    (MealType::Lunch, 1, 180.0),
    (MealType::Lunch, 2, 200.0),
    (MealType::Dinner, 3, 200.0),
    (MealType::Snack, 4, 150.0),
];

const DAYS: i64 = 14;
const START_WEIGHT_KG: f64 = 82.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let username = std::env::args().nth(1).unwrap_or_else(|| "testuser".to_string());

    let db_path = fitmacro::config::database_path();
    println!("Database path: {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| {
        fitmacro::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let user = database
        .with_conn(|conn| User::get_by_username(conn, &username))?
        .ok_or_else(|| format!("user '{}' not found; run create_test_users first", username))?;

    let today = Local::now().date_naive();
    let start = today - Duration::days(DAYS - 1);

    let food_ids = database.with_conn(|conn| {
        let mut ids = Vec::with_capacity(FOODS.len());
        for (name, kcal, protein, fat, carb) in FOODS {
            let existing = FoodItem::search(conn, user.id, name, 10)?
                .into_iter()
                .find(|f| f.name == name && f.user_id.is_none());
            let item = match existing {
                Some(item) => item,
                None => FoodItem::create(
                    conn,
                    &FoodItemCreate {
                        user_id: None,
                        name: name.to_string(),
                        brand: String::new(),
                        kcal_per_100g: kcal,
                        protein_per_100g: protein,
                        fat_per_100g: fat,
                        carb_per_100g: carb,
                    },
                )?,
            };
            ids.push(item.id);
        }
        Ok(ids)
    })?;
    println!("Food items ready: {}", food_ids.len());

    database.with_conn_mut(|conn| {
        let (goal, _) = Goal::set_active(
            conn,
            user.id,
            &GoalCreate {
                start_date: start,
                target_date: Some(today + Duration::days(60)),
                start_weight_kg: Some(START_WEIGHT_KG),
                target_weight_kg: Some(76.0),
                daily_kcal_target: 1800,
                daily_protein_target: Some(120),
                daily_fat_target: Some(60),
                daily_carb_target: Some(190),
            },
        )?;
        println!("Active goal {} from {}", goal.id, goal.start_date);
        Ok(())
    })?;

    database.with_conn_mut(|conn| {
        for offset in 0..DAYS {
            let date = start + Duration::days(offset);
            // +/-10% around the base portion, repeating weekly
            let factor = 0.9 + (offset % 7) as f64 * 0.033;

            for (meal_type, food, grams) in MENU {
                let (meal, _) = Meal::get_or_create(conn, user.id, date, meal_type)?;
                MealItem::create(conn, meal.id, food_ids[food], (grams * factor).round())?;
            }

            let weight = START_WEIGHT_KG - offset as f64 * 0.08;
            WeightLog::upsert(conn, user.id, date, weight)?;
        }
        Ok(())
    })?;

    println!("Loaded {} days of meals and weights for '{}'", DAYS, username);
    Ok(())
}
