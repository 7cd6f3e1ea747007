//! User model
//!
//! Identity of the caller plus the preferences a browser session would carry.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub language: Option<String>,
    pub theme: Option<String>,
    pub created_at: String,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            language: row.get("language")?,
            theme: row.get("theme")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let user = conn
            .query_row("SELECT * FROM users WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(user)
    }

    pub fn get_by_username(conn: &Connection, username: &str) -> DbResult<Option<Self>> {
        let user = conn
            .query_row("SELECT * FROM users WHERE username = ?1", [username], Self::from_row)
            .optional()?;
        Ok(user)
    }

    /// Get or create a user by username. Returns the user and whether it was created.
    pub fn get_or_create(conn: &Connection, username: &str) -> DbResult<(Self, bool)> {
        let inserted = conn.execute(
            "INSERT INTO users (username) VALUES (?1) ON CONFLICT(username) DO NOTHING",
            [username],
        )?;

        let user = conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            [username],
            Self::from_row,
        )?;
        Ok((user, inserted > 0))
    }

    pub fn set_language(conn: &Connection, id: i64, language: &str) -> DbResult<()> {
        conn.execute(
            "UPDATE users SET language = ?1 WHERE id = ?2",
            params![language, id],
        )?;
        Ok(())
    }

    pub fn set_theme(conn: &Connection, id: i64, theme: &str) -> DbResult<()> {
        conn.execute(
            "UPDATE users SET theme = ?1 WHERE id = ?2",
            params![theme, id],
        )?;
        Ok(())
    }
}
