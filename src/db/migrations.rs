//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS
        -- Identity plus persisted session preferences
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            language TEXT CHECK(language IN ('ru', 'en')),
            theme TEXT CHECK(theme IN ('light', 'dark')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- FOOD ITEMS
        -- Nutrient densities per 100 g
        -- ============================================
        CREATE TABLE food_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,  -- NULL = shared
            name TEXT NOT NULL,
            brand TEXT NOT NULL DEFAULT '',

            kcal_per_100g REAL NOT NULL CHECK(kcal_per_100g >= 0),
            protein_per_100g REAL NOT NULL DEFAULT 0 CHECK(protein_per_100g >= 0),
            fat_per_100g REAL NOT NULL DEFAULT 0 CHECK(fat_per_100g >= 0),
            carb_per_100g REAL NOT NULL DEFAULT 0 CHECK(carb_per_100g >= 0),

            source TEXT NOT NULL DEFAULT 'manual' CHECK(source IN ('manual', 'openfoodfacts')),
            external_id TEXT NOT NULL DEFAULT '',

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_items_name ON food_items(name);
        CREATE INDEX idx_food_items_user ON food_items(user_id);
        CREATE UNIQUE INDEX uniq_fooditem_source_external_id
            ON food_items(source, external_id) WHERE external_id <> '';

        -- ============================================
        -- MEALS
        -- One per user, date and slot
        -- ============================================
        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date, meal_type)
        );

        CREATE INDEX idx_meals_user_date ON meals(user_id, date);

        -- ============================================
        -- MEAL ITEMS
        -- Portions in grams; nutrition is derived, never cached
        -- ============================================
        CREATE TABLE meal_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            food_item_id INTEGER NOT NULL REFERENCES food_items(id) ON DELETE RESTRICT,
            grams REAL NOT NULL CHECK(grams > 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_items_meal ON meal_items(meal_id);
        CREATE INDEX idx_meal_items_food ON meal_items(food_item_id);

        -- ============================================
        -- GOALS
        -- At most one active goal per user
        -- ============================================
        CREATE TABLE goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            target_date TEXT,
            start_weight_kg REAL,
            target_weight_kg REAL,
            daily_kcal_target INTEGER NOT NULL CHECK(daily_kcal_target > 0),
            daily_protein_target INTEGER CHECK(daily_protein_target >= 0),
            daily_fat_target INTEGER CHECK(daily_fat_target >= 0),
            daily_carb_target INTEGER CHECK(daily_carb_target >= 0),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_goals_user ON goals(user_id);
        CREATE UNIQUE INDEX uniq_active_goal ON goals(user_id) WHERE is_active = 1;

        -- ============================================
        -- WEIGHT LOGS
        -- One observation per user per day
        -- ============================================
        CREATE TABLE weight_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            weight_kg REAL NOT NULL CHECK(weight_kg > 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date)
        );

        -- ============================================
        -- CACHE ENTRIES
        -- Best-effort key/value store for catalog lookups
        -- ============================================
        CREATE TABLE cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER NOT NULL          -- unix seconds
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
