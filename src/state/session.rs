use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::data::Session;

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "authToken";
/// Key holding the signed-in user's email
pub const EMAIL_KEY: &str = "userEmail";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// The SessionStore keeps the signed-in session across restarts.
///
/// It is a tiny key/value table in SQLite holding exactly two entries,
/// `authToken` and `userEmail`. There is no expiry: a token is trusted until
/// a request fails or the user logs out.
pub struct SessionStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SessionStore {
    /// Open (or create) the store at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Session store at: {}", db_path.display());

        let store = SessionStore {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = SessionStore {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Session saved by a previous run, if any
    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.get(TOKEN_KEY)? else {
            return Ok(None);
        };

        Ok(Some(Session {
            token,
            email: self.get(EMAIL_KEY)?,
        }))
    }

    /// Persist a fresh login.
    ///
    /// The email is only overwritten when the server reported one; the
    /// returned session carries whichever email is now stored.
    pub fn login_success(&self, token: &str, email: Option<&str>) -> Result<Session, StoreError> {
        self.set(TOKEN_KEY, token)?;
        if let Some(email) = email {
            self.set(EMAIL_KEY, email)?;
        }

        Ok(Session {
            token: token.to_string(),
            email: self.get(EMAIL_KEY)?,
        })
    }

    /// Forget the session entirely
    pub fn logout(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM settings WHERE key IN (?1, ?2)",
            rusqlite::params![TOKEN_KEY, EMAIL_KEY],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
