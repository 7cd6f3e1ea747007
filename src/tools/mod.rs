//! FitMacro tools
//!
//! Tool implementations behind the MCP server. Each takes the database, the
//! resolved request context and plain arguments, and returns a serialisable
//! response.

pub mod catalog;
pub mod dashboard;
pub mod food_items;
pub mod goals;
pub mod meals;
pub mod preferences;
pub mod reports;
pub mod status;
pub mod weight;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::nutrition::round_to;

/// Largest value the 2-decimal columns hold (7 digits)
pub const MAX_DECIMAL: f64 = 99_999.99;
/// Largest body weight the schema holds (5 digits)
pub const MAX_WEIGHT_KG: f64 = 999.99;
pub const MAX_TEXT_LEN: usize = 200;

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(field: &'static str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(field, format!("expected YYYY-MM-DD, got '{}'", value)))
}

/// Check `min <= value <= max` (or `min < value` when `exclusive_min`)
/// against the value as stored, rounded to 2 decimals
pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    exclusive_min: bool,
    max: f64,
) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(field, "must be a number"));
    }
    let value = round_to(value, 2);
    let below = if exclusive_min { value <= min } else { value < min };
    if below {
        let op = if exclusive_min { "greater than" } else { "at least" };
        return Err(AppError::validation(field, format!("must be {} {}", op, min)));
    }
    if value > max {
        return Err(AppError::validation(field, format!("must be at most {}", max)));
    }
    Ok(())
}

pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(field, format!("must be at most {} characters", max)));
    }
    Ok(())
}

/// First `max` characters of `s`
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::RequestContext;
    use crate::db::Database;
    use crate::models::User;

    /// Fresh database with one user and that user's resolved context
    pub fn setup(username: &str) -> (Database, RequestContext) {
        let db = Database::in_memory().unwrap();
        let ctx = db
            .with_conn(|conn| {
                User::get_or_create(conn, username)?;
                Ok(RequestContext::resolve(conn, username, Some("en")).unwrap())
            })
            .unwrap();
        (db, ctx)
    }

    pub fn add_user(db: &Database, username: &str) -> RequestContext {
        db.with_conn(|conn| {
            User::get_or_create(conn, username)?;
            Ok(RequestContext::resolve(conn, username, Some("ru")).unwrap())
        })
        .unwrap()
    }
}
