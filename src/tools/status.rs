//! FitMacro Status Tool
//!
//! Runtime status of the service plus the usage guide served to clients.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::{migrations, Database};

/// How to drive the tools, for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# FitMacro Usage

Every tool except `get_status` and `get_instructions` takes `user`, the
username of the person you are acting for. Unknown users are rejected.
`accept_language` (optional, e.g. "ru-RU,ru;q=0.9") picks the language the
first time a user is seen; afterwards the stored preference wins.

## Logging food

1. Find a food: `search_food_items` over shared and own items.
2. Nothing suitable? `search_catalog` queries OpenFoodFacts, then
   `import_catalog_product` with the product `code` stores it as a shared
   item. Products without calorie data cannot be imported.
3. Or enter it by hand with `add_food_item` (values per 100 g).
4. `log_meal_item` with `date` (YYYY-MM-DD), `meal_type`
   (breakfast, lunch, dinner, snack), `food_item_id` and `grams`.

## Goals and weight

- `set_goal` replaces the active goal. `daily_kcal_target` is required;
  macro targets and weights are optional.
- `add_weight` stores one value per day; logging again the same day
  overwrites it. Future dates are rejected.

## Progress

- `get_dashboard`: last 14 days of intake, today's progress against the
  goal, latest weight and the weight forecast (needs a goal with a start
  weight and at least one weight log).
- `export_calorie_chart` writes a PNG, `generate_progress_report` a PDF.

## Notes

- Dates use ISO format: YYYY-MM-DD
- Nutrition is always derived from grams and the food's per-100g values
"#;

/// Runtime status of the FitMacro service
#[derive(Debug, Clone, Serialize)]
pub struct FitMacroStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> FitMacroStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());
        let schema_version = db.with_conn(migrations::get_schema_version).ok();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitMacroStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_schema_version() {
        let db = Database::in_memory().unwrap();
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/fitmacro.db"));
        let status = tracker.get_status(&db);

        assert_eq!(status.schema_version, Some(1));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }
}
