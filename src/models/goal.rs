//! Goal model
//!
//! A user's calorie/macro targets. Exactly one goal per user may be active.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::round_to;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub start_weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub daily_kcal_target: i64,
    pub daily_protein_target: Option<i64>,
    pub daily_fat_target: Option<i64>,
    pub daily_carb_target: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

/// Data for setting a new goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCreate {
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub start_weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub daily_kcal_target: i64,
    pub daily_protein_target: Option<i64>,
    pub daily_fat_target: Option<i64>,
    pub daily_carb_target: Option<i64>,
}

impl Goal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            start_date: row.get("start_date")?,
            target_date: row.get("target_date")?,
            start_weight_kg: row.get("start_weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            daily_kcal_target: row.get("daily_kcal_target")?,
            daily_protein_target: row.get("daily_protein_target")?,
            daily_fat_target: row.get("daily_fat_target")?,
            daily_carb_target: row.get("daily_carb_target")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Make `data` the user's active goal, deactivating any previous one in the
    /// same transaction. Returns the new goal and the id it superseded.
    pub fn set_active(conn: &mut Connection, user_id: i64, data: &GoalCreate) -> DbResult<(Self, Option<i64>)> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = match tx.query_row(
            "SELECT id FROM goals WHERE user_id = ?1 AND is_active = 1",
            [user_id],
            |row| row.get::<_, i64>(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        tx.execute(
            "UPDATE goals SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            [user_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO goals (
                user_id, start_date, target_date, start_weight_kg, target_weight_kg,
                daily_kcal_target, daily_protein_target, daily_fat_target, daily_carb_target,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)
            "#,
            params![
                user_id,
                data.start_date,
                data.target_date,
                data.start_weight_kg.map(|kg| round_to(kg, 2)),
                data.target_weight_kg.map(|kg| round_to(kg, 2)),
                data.daily_kcal_target,
                data.daily_protein_target,
                data.daily_fat_target,
                data.daily_carb_target,
            ],
        )?;

        let id = tx.last_insert_rowid();
        let goal = tx.query_row("SELECT * FROM goals WHERE id = ?1", [id], Self::from_row)?;
        tx.commit()?;

        Ok((goal, previous))
    }

    /// The user's active goal, if any
    pub fn get_active(conn: &Connection, user_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM goals WHERE user_id = ?1 AND is_active = 1",
        )?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(goal) => Ok(Some(goal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_active(conn: &Connection, user_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM goals WHERE user_id = ?1 AND is_active = 1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::User;

    fn goal(kcal: i64) -> GoalCreate {
        GoalCreate {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            target_date: None,
            start_weight_kg: Some(80.0),
            target_weight_kg: Some(75.0),
            daily_kcal_target: kcal,
            daily_protein_target: Some(120),
            daily_fat_target: None,
            daily_carb_target: None,
        }
    }

    #[test]
    fn test_new_goal_supersedes_active_one() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let (user, _) = User::get_or_create(&conn, "g").unwrap();

        let (first, previous) = Goal::set_active(&mut conn, user.id, &goal(2000)).unwrap();
        assert!(previous.is_none());

        let (second, previous) = Goal::set_active(&mut conn, user.id, &goal(1800)).unwrap();
        assert_eq!(previous, Some(first.id));

        assert_eq!(Goal::count_active(&conn, user.id).unwrap(), 1);
        let active = Goal::get_active(&conn, user.id).unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.daily_kcal_target, 1800);
    }

    #[test]
    fn test_partial_index_rejects_second_active_goal() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let (user, _) = User::get_or_create(&conn, "g").unwrap();

        let insert = "INSERT INTO goals (user_id, start_date, daily_kcal_target, is_active)
                      VALUES (?1, '2025-01-01', 2000, 1)";
        conn.execute(insert, [user.id]).unwrap();
        assert!(conn.execute(insert, [user.id]).is_err());
    }
}
