//! FitMacro Planner Library
//!
//! Meal logging, calorie and macro goals, and weight forecasting.

pub mod build_info;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
