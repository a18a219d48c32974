// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User records — registration and credential lookup.
//
// Usernames are unique at the schema level; the registration handler also
// checks first so it can return a friendly message, the constraint is the
// backstop against races.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::{User, UserId};

use crate::db_err;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

/// User store backed by a SQLite database.
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Open (or create) the user database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        info!("user database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory user database opened");
        Ok(Self { conn })
    }

    /// Insert a new user.
    ///
    /// A duplicate username surfaces as a `Validation` error so the HTTP
    /// layer can answer 400 rather than 500.
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
    pub fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                info!(username = %user.username, "user registered");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DruckwerkError::Validation("user exists".into()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Look up a user by username (for login).
    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()
            .map_err(db_err)
    }

    /// Storage reachability probe for the readiness endpoint.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let username: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let created_at_str: String = row.get(3)?;

    let id = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: UserId(id),
        username,
        password_hash,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(name: &str) -> User {
        User::new(name.into(), "pbkdf2-sha256$100000$00$00".into())
    }

    #[test]
    fn create_and_find_user() {
        let store = UserStore::open_in_memory().expect("open in-memory db");
        let user = test_user("alice");
        store.create_user(&user).expect("create");

        let found = store
            .find_by_username("alice")
            .expect("find")
            .expect("present");
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, user.password_hash);
    }

    #[test]
    fn unknown_username_returns_none() {
        let store = UserStore::open_in_memory().expect("open in-memory db");
        assert!(store.find_by_username("ghost").expect("find").is_none());
    }

    #[test]
    fn duplicate_username_is_a_validation_error() {
        let store = UserStore::open_in_memory().expect("open in-memory db");
        store.create_user(&test_user("alice")).expect("create");

        let err = store.create_user(&test_user("alice")).unwrap_err();
        assert!(matches!(err, DruckwerkError::Validation(_)));
    }

    #[test]
    fn ping_succeeds_on_open_store() {
        let store = UserStore::open_in_memory().expect("open in-memory db");
        store.ping().expect("ping");
    }
}
