//! Runtime configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://world.openfoodfacts.org";
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub catalog: CatalogConfig,
    pub report_dir: PathBuf,
}

/// Settings for the OpenFoodFacts client
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub search_timeout: Duration,
    pub product_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            search_timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            product_timeout: Duration::from_secs(DEFAULT_PRODUCT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let catalog = CatalogConfig {
            base_url: std::env::var("FITMACRO_CATALOG_URL")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            search_timeout: secs_from_env("FITMACRO_CATALOG_TIMEOUT_SECS", DEFAULT_SEARCH_TIMEOUT_SECS),
            product_timeout: secs_from_env("FITMACRO_CATALOG_PRODUCT_TIMEOUT_SECS", DEFAULT_PRODUCT_TIMEOUT_SECS),
        };

        let report_dir = std::env::var("FITMACRO_REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            database_path: database_path(),
            catalog,
            report_dir,
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var("FITMACRO_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
                    path = grandparent.to_path_buf();
                }
            }

            path.push("data");
            path.push("fitmacro.db");
            path
        })
}
