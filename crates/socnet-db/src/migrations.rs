use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Drops and recreates every table. There is no migration path: each run
/// starts from an empty schema.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS status;
        DROP TABLE IF EXISTS users;

        CREATE TABLE users (
            user_id         TEXT PRIMARY KEY NOT NULL,
            user_name       TEXT NOT NULL,
            user_last_name  TEXT NOT NULL,
            user_email      TEXT NOT NULL
        );

        CREATE TABLE status (
            status_id       TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL
                            REFERENCES users(user_id)
                            ON UPDATE RESTRICT
                            ON DELETE CASCADE,
            status_text     TEXT NOT NULL
        );

        CREATE INDEX idx_status_user
            ON status(user_id, status_id);
        ",
    )?;

    info!("Database schema recreated");
    Ok(())
}
