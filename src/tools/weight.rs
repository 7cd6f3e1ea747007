//! Weight log tools

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::WeightLog;
use super::{check_range, MAX_WEIGHT_KG};

/// Response for add_weight
#[derive(Debug, Serialize)]
pub struct AddWeightResponse {
    pub log: WeightLog,
    pub created: bool,
    pub message: String,
}

/// Response for list_weight_logs
#[derive(Debug, Serialize)]
pub struct ListWeightLogsResponse {
    pub logs: Vec<WeightLog>,
    pub count: usize,
}

/// Record body weight for a day; a second entry for the same day replaces it
pub fn add_weight(
    db: &Database,
    ctx: &RequestContext,
    date: NaiveDate,
    weight_kg: f64,
    today: NaiveDate,
) -> AppResult<AddWeightResponse> {
    check_range("weight_kg", weight_kg, 0.0, true, MAX_WEIGHT_KG)?;
    if date > today {
        return Err(AppError::validation(
            "date",
            ctx.tr("дата не может быть в будущем", "cannot be in the future"),
        ));
    }

    let (log, created) = db.with_conn_mut(|conn| WeightLog::upsert(conn, ctx.user_id, date, weight_kg))?;
    info!(user_id = ctx.user_id, %date, weight_kg = log.weight_kg, created, "Weight logged");

    Ok(AddWeightResponse {
        log,
        created,
        message: ctx.tr("Вес сохранён.", "Weight saved.").to_string(),
    })
}

/// Most recent weight logs first
pub fn list_weight_logs(db: &Database, ctx: &RequestContext, limit: i64) -> AppResult<ListWeightLogsResponse> {
    let limit = limit.clamp(1, 366);
    let logs = db.with_conn(|conn| WeightLog::list(conn, ctx.user_id, limit))?;
    let count = logs.len();
    Ok(ListWeightLogsResponse { logs, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::setup;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_same_day_updates_existing_log() {
        let (db, ctx) = setup("w");
        let first = add_weight(&db, &ctx, d(10), 82.456, d(10)).unwrap();
        assert!(first.created);
        assert_eq!(first.log.weight_kg, 82.46);

        let second = add_weight(&db, &ctx, d(10), 82.1, d(12)).unwrap();
        assert!(!second.created);
        assert_eq!(second.log.id, first.log.id);

        add_weight(&db, &ctx, d(11), 81.9, d(12)).unwrap();
        let listed = list_weight_logs(&db, &ctx, 10).unwrap();
        assert_eq!(listed.count, 2);
        assert_eq!(listed.logs[0].date, d(11));
        assert_eq!(listed.logs[1].weight_kg, 82.1);
    }

    #[test]
    fn test_rejects_future_dates_and_bad_weights() {
        let (db, ctx) = setup("w");
        assert!(matches!(
            add_weight(&db, &ctx, d(13), 80.0, d(12)),
            Err(AppError::Validation { field: "date", .. })
        ));
        assert!(matches!(
            add_weight(&db, &ctx, d(12), 0.0, d(12)),
            Err(AppError::Validation { field: "weight_kg", .. })
        ));
        assert!(matches!(
            add_weight(&db, &ctx, d(12), 1000.0, d(12)),
            Err(AppError::Validation { field: "weight_kg", .. })
        ));
        assert_eq!(list_weight_logs(&db, &ctx, 10).unwrap().count, 0);
    }

    #[test]
    fn test_weight_rounding_to_zero_is_rejected_without_writes() {
        let (db, ctx) = setup("w");
        let err = add_weight(&db, &ctx, d(12), 0.004, d(12)).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "weight_kg", .. }));
        assert!(err.is_invalid_input());

        let rows: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM weight_logs", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
