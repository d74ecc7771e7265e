//! SQLite persistence for users and their status posts.
//!
//! A [`Database`] is opened once and handed by reference to the
//! [`UserCollection`], [`UserStatusCollection`] and [`BulkLoader`] that work
//! on it.

pub mod error;
pub mod loader;
pub mod migrations;
pub mod models;
pub mod statuses;
pub mod users;

pub use error::StoreError;
pub use loader::{BulkLoader, LoadReport};
pub use models::{StatusRow, UserRow};
pub use statuses::{StatusCursor, UserStatusCollection};
pub use users::UserCollection;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens the database file and recreates the schema from scratch.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::reset(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    /// Exclusive access, needed to open a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_open_recreates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("socialnetwork.db");

        {
            let db = Database::open(&path).unwrap();
            UserCollection::new(&db)
                .add("bob123", "bob123@gmail.com", "Bob", "Belcher")
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(UserCollection::new(&db).search("bob123").unwrap().is_none());
    }
}
