//! FitMacro Planner
//!
//! An MCP server for meal logging, calorie goals and weight forecasting.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use fitmacro::build_info;
use fitmacro::config::AppConfig;
use fitmacro::db;
use fitmacro::mcp::FitMacroService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fitmacro=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = AppConfig::from_env();
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Catalog: {}", config.catalog.base_url);

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = db::Database::new(&config.database_path)?;

    // Run migrations
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let service = FitMacroService::new(&config, database);
    tracing::info!("fitmacro service ready");

    // Start the MCP server over stdio
    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
