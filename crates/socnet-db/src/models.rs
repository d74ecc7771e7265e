//! Database row types. These map directly to SQLite rows.
use rusqlite::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: String,
    pub user_name: String,
    pub user_last_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub status_id: String,
    pub user_id: String,
    pub status_text: String,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str = "user_id, user_name, user_last_name, user_email";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            user_name: row.get(1)?,
            user_last_name: row.get(2)?,
            user_email: row.get(3)?,
        })
    }
}

impl StatusRow {
    pub(crate) const COLUMNS: &'static str = "status_id, user_id, status_text";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status_id: row.get(0)?,
            user_id: row.get(1)?,
            status_text: row.get(2)?,
        })
    }
}
