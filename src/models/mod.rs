//! Data models
//!
//! Rust structs representing database entities.

mod food_item;
mod goal;
mod meal;
mod meal_item;
mod nutrition;
mod user;
mod weight_log;

pub use food_item::{FoodItem, FoodItemCreate, FoodItemImport, FoodSource};
pub use goal::{Goal, GoalCreate};
pub use meal::{Meal, MealType};
pub use meal_item::{MealItem, MealItemDetail, Portion};
pub use nutrition::{Nutrient, Nutrition};
pub use user::User;
pub use weight_log::WeightLog;
