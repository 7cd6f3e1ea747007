//! Weight Log model
//!
//! One body-weight observation per user per day.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::round_to;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightLog {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub created_at: String,
}

impl WeightLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            weight_kg: row.get("weight_kg")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Record the weight for a day, replacing an earlier entry for that day.
    /// Returns the log and whether it was newly created.
    pub fn upsert(conn: &mut Connection, user_id: i64, date: NaiveDate, weight_kg: f64) -> DbResult<(Self, bool)> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existed = Self::get_for_date(&tx, user_id, date)?.is_some();

        tx.execute(
            r#"
            INSERT INTO weight_logs (user_id, date, weight_kg)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, date) DO UPDATE SET weight_kg = excluded.weight_kg
            "#,
            params![user_id, date, round_to(weight_kg, 2)],
        )?;

        let log = tx.query_row(
            "SELECT * FROM weight_logs WHERE user_id = ?1 AND date = ?2",
            params![user_id, date],
            Self::from_row,
        )?;
        tx.commit()?;
        Ok((log, !existed))
    }

    pub fn get_for_date(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Option<Self>> {
        let log = conn
            .query_row(
                "SELECT * FROM weight_logs WHERE user_id = ?1 AND date = ?2",
                params![user_id, date],
                Self::from_row,
            )
            .optional()?;
        Ok(log)
    }

    /// Most recent observation by date
    pub fn latest(conn: &Connection, user_id: i64) -> DbResult<Option<Self>> {
        let log = conn
            .query_row(
                "SELECT * FROM weight_logs WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT 1",
                [user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(log)
    }

    /// Newest first
    pub fn list(conn: &Connection, user_id: i64, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM weight_logs WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2",
        )?;

        let logs = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}
