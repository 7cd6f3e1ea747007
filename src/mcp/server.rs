//! FitMacro MCP Server Implementation
//!
//! Implements the MCP server with all FitMacro tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::{CacheStore, CatalogClient, HttpTransport, SqliteCache};
use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::db::Database;
use crate::error::AppError;
use crate::models::{FoodItemCreate, GoalCreate, MealType};
use crate::tools::catalog as catalog_tools;
use crate::tools::status::StatusTracker;
use crate::tools::{dashboard, food_items, goals, meals, parse_date, preferences, reports, weight};

/// FitMacro MCP Service
#[derive(Clone)]
pub struct FitMacroService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    catalog: Arc<CatalogClient>,
    report_dir: PathBuf,
    tool_router: ToolRouter<FitMacroService>,
}

impl FitMacroService {
    pub fn new(config: &AppConfig, database: Database) -> Self {
        let cache: Arc<dyn CacheStore> = Arc::new(SqliteCache::new(database.clone()));
        let catalog = CatalogClient::new(config.catalog.clone(), Arc::new(HttpTransport), Some(cache));

        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone()))),
            database,
            catalog: Arc::new(catalog),
            report_dir: config.report_dir.clone(),
            tool_router: Self::tool_router(),
        }
    }

    /// Resolve the caller; the pooled connection is released on return
    fn context(&self, user: &str, accept_language: Option<&str>) -> Result<RequestContext, McpError> {
        let conn = self.database.get_conn().map_err(|e| to_mcp_error(e.into()))?;
        RequestContext::resolve(&conn, user, accept_language).map_err(to_mcp_error)
    }
}

fn to_mcp_error(e: AppError) -> McpError {
    match e {
        AppError::Unauthenticated(_) => McpError::invalid_request(e.to_string(), None),
        ref e if e.is_invalid_input() => McpError::invalid_params(e.to_string(), None),
        e => McpError::internal_error(e.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse an optional date argument, defaulting to today
fn date_or_today(field: &'static str, value: Option<&str>) -> Result<NaiveDate, McpError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_date(field, v).map_err(to_mcp_error),
        None => Ok(today()),
    }
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserParams {
    /// Username of the person you act for
    pub user: String,
    /// Accept-Language style hint, used when the user has no language yet
    pub accept_language: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodItemParams {
    pub user: String,
    pub accept_language: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    /// Energy per 100 g
    pub kcal_per_100g: f64,
    #[serde(default)]
    pub protein_per_100g: f64,
    #[serde(default)]
    pub fat_per_100g: f64,
    #[serde(default)]
    pub carb_per_100g: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodItemsParams {
    pub user: String,
    pub accept_language: Option<String>,
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodItemsParams {
    pub user: String,
    pub accept_language: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealItemParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// breakfast, lunch, dinner or snack
    pub meal_type: String,
    pub food_item_id: i64,
    pub grams: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDayParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWeightParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    pub weight_kg: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListWeightLogsParams {
    pub user: String,
    pub accept_language: Option<String>,
    #[serde(default = "default_weight_limit")]
    pub limit: i64,
}

fn default_weight_limit() -> i64 { 30 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub start_weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub daily_kcal_target: i64,
    pub daily_protein_target: Option<i64>,
    pub daily_fat_target: Option<i64>,
    pub daily_carb_target: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCatalogParams {
    pub user: String,
    pub accept_language: Option<String>,
    pub query: String,
    #[serde(default = "default_catalog_limit")]
    pub limit: usize,
}

fn default_catalog_limit() -> usize { 10 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportCatalogProductParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// OpenFoodFacts product code (barcode)
    pub code: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetLanguageParams {
    pub user: String,
    /// ru or en
    pub language: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReportParams {
    pub user: String,
    pub accept_language: Option<String>,
    /// Output file; defaults to a file in the report directory
    pub output_path: Option<String>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl FitMacroService {
    // --- Status ---

    #[tool(description = "Get the current status of the FitMacro service including build info, database status, and process information")]
    async fn get_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get instructions for logging food, goals and weight. Call this when starting a session or when unsure how to use the tools.")]
    fn get_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Food Items ---

    #[tool(description = "Create a food item owned by the user, with energy and macros per 100 g")]
    fn add_food_item(&self, Parameters(p): Parameters<AddFoodItemParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let data = FoodItemCreate {
            user_id: Some(ctx.user_id),
            name: p.name,
            brand: p.brand.unwrap_or_default(),
            kcal_per_100g: p.kcal_per_100g,
            protein_per_100g: p.protein_per_100g,
            fat_per_100g: p.fat_per_100g,
            carb_per_100g: p.carb_per_100g,
        };
        let result = food_items::add_food_item(&self.database, &ctx, data).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Search shared and the user's own food items by name or brand")]
    fn search_food_items(&self, Parameters(p): Parameters<SearchFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = food_items::search_food_items(&self.database, &ctx, &p.query, p.limit).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "List shared and the user's own food items by name, with pagination")]
    fn list_food_items(&self, Parameters(p): Parameters<ListFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = food_items::list_food_items(&self.database, &ctx, p.limit, p.offset).map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Log grams of a food item into a meal slot (breakfast/lunch/dinner/snack) on a date")]
    fn log_meal_item(&self, Parameters(p): Parameters<LogMealItemParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let date = date_or_today("date", p.date.as_deref())?;
        let meal_type = MealType::from_str(&p.meal_type).ok_or_else(|| {
            to_mcp_error(AppError::validation("meal_type", "expected breakfast, lunch, dinner or snack"))
        })?;
        let result = meals::log_meal_item(&self.database, &ctx, date, meal_type, p.food_item_id, p.grams)
            .map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a day's meals with per-item nutrition and day totals")]
    fn get_day(&self, Parameters(p): Parameters<GetDayParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let date = date_or_today("date", p.date.as_deref())?;
        let result = meals::get_day(&self.database, &ctx, date).map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Weight ---

    #[tool(description = "Record body weight for a day (one entry per day; a repeat overwrites it)")]
    fn add_weight(&self, Parameters(p): Parameters<AddWeightParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let date = date_or_today("date", p.date.as_deref())?;
        let result = weight::add_weight(&self.database, &ctx, date, p.weight_kg, today()).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "List the user's weight logs, newest first")]
    fn list_weight_logs(&self, Parameters(p): Parameters<ListWeightLogsParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = weight::list_weight_logs(&self.database, &ctx, p.limit).map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Goals ---

    #[tool(description = "Set a new active goal (replaces the current one). daily_kcal_target is required.")]
    fn set_goal(&self, Parameters(p): Parameters<SetGoalParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let start_date = date_or_today("start_date", p.start_date.as_deref())?;
        let target_date = match p.target_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(parse_date("target_date", v).map_err(to_mcp_error)?),
            None => None,
        };
        let data = GoalCreate {
            start_date,
            target_date,
            start_weight_kg: p.start_weight_kg,
            target_weight_kg: p.target_weight_kg,
            daily_kcal_target: p.daily_kcal_target,
            daily_protein_target: p.daily_protein_target,
            daily_fat_target: p.daily_fat_target,
            daily_carb_target: p.daily_carb_target,
        };
        let result = goals::set_goal(&self.database, &ctx, data).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Get the user's active goal, if any")]
    fn get_active_goal(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = goals::get_active_goal(&self.database, &ctx).map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Dashboard ---

    #[tool(description = "Get the 14-day dashboard: daily kcal/protein/fat/carb series, today's progress against the goal, latest weight and weight forecast")]
    fn get_dashboard(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = dashboard::get_dashboard(&self.database, &ctx, today()).map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Catalog ---

    #[tool(description = "Search the OpenFoodFacts catalog (Russian products first). Returns products with per-100g values; import one with import_catalog_product.")]
    async fn search_catalog(&self, Parameters(p): Parameters<SearchCatalogParams>) -> Result<CallToolResult, McpError> {
        self.context(&p.user, p.accept_language.as_deref())?;
        let catalog = self.catalog.clone();
        let result = tokio::task::spawn_blocking(move || catalog_tools::search_catalog(&catalog, &p.query, p.limit))
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        json_result(&result)
    }

    #[tool(description = "Import an OpenFoodFacts product by code as a shared food item (creates or updates it)")]
    async fn import_catalog_product(&self, Parameters(p): Parameters<ImportCatalogProductParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let catalog = self.catalog.clone();
        let database = self.database.clone();
        let result = tokio::task::spawn_blocking(move || {
            catalog_tools::import_catalog_product(&database, &catalog, &ctx, &p.code)
        })
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?
        .map_err(to_mcp_error)?;
        json_result(&result)
    }

    // --- Preferences ---

    #[tool(description = "Set the user's interface language (ru or en)")]
    fn set_language(&self, Parameters(p): Parameters<SetLanguageParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, None)?;
        let result = preferences::set_language(&self.database, &ctx, &p.language).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Switch the user's theme between light and dark")]
    fn toggle_theme(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = preferences::toggle_theme(&self.database, &ctx).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Get the user's language and theme")]
    fn get_preferences(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        json_result(&preferences::get_preferences(&ctx))
    }

    // --- Reports ---

    #[tool(description = "Export the 14-day daily calorie chart (with goal line) as a PNG file")]
    fn export_calorie_chart(&self, Parameters(p): Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = reports::export_calorie_chart(&self.database, &ctx, today(), p.output_path.as_deref(), &self.report_dir)
            .map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Generate a PDF progress report: goal, today's progress, forecast, daily intake table and calorie chart")]
    fn generate_progress_report(&self, Parameters(p): Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let ctx = self.context(&p.user, p.accept_language.as_deref())?;
        let result = reports::generate_progress_report(&self.database, &ctx, today(), p.output_path.as_deref(), &self.report_dir)
            .map_err(to_mcp_error)?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for FitMacroService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitmacro".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FitMacro Planner".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FitMacro Planner - meal logging, calorie/macro goals and weight forecasting. \
                 IMPORTANT: call get_instructions first. Every user tool takes `user` (username). \
                 Food: add_food_item/search_food_items/list_food_items, search_catalog/import_catalog_product (OpenFoodFacts). \
                 Diary: log_meal_item/get_day. Weight: add_weight/list_weight_logs. \
                 Goals: set_goal/get_active_goal. Progress: get_dashboard, export_calorie_chart, generate_progress_report. \
                 Preferences: set_language/toggle_theme/get_preferences."
                    .into(),
            ),
        }
    }
}
