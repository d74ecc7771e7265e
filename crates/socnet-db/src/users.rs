use rusqlite::params;
use tracing::{info, warn};

use crate::error::{Constraint, OptionalExt, constraint_of};
use crate::models::UserRow;
use crate::{Database, Result, StoreError};

const TABLE: &str = "user";

/// CRUD access to the `users` table.
pub struct UserCollection<'db> {
    db: &'db Database,
}

impl<'db> UserCollection<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    pub fn add(&self, user_id: &str, email: &str, user_name: &str, user_last_name: &str) -> Result<()> {
        let inserted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO users (user_id, user_name, user_last_name, user_email)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, user_name, user_last_name, email],
            ))
        })?;

        match inserted {
            Ok(_) => {
                info!("User {} added", user_id);
                Ok(())
            }
            Err(e) if constraint_of(&e) == Some(Constraint::Unique) => {
                warn!("User {} already exists", user_id);
                Err(StoreError::DuplicateKey {
                    table: TABLE,
                    id: user_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces every field except the id.
    pub fn modify(&self, user_id: &str, email: &str, user_name: &str, user_last_name: &str) -> Result<()> {
        let updated = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET user_email = ?2, user_name = ?3, user_last_name = ?4
                 WHERE user_id = ?1",
                params![user_id, email, user_name, user_last_name],
            )?)
        })?;

        if updated == 0 {
            warn!("User {} cannot be modified as it doesn't exist", user_id);
            return Err(self.not_found(user_id));
        }

        info!(
            "User {} modified to email {}, name {} and last name {}",
            user_id, email, user_name, user_last_name
        );
        Ok(())
    }

    /// Deletes the user. Its statuses go with it via `ON DELETE CASCADE`.
    pub fn delete(&self, user_id: &str) -> Result<()> {
        let deleted = self
            .db
            .with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", [user_id])?))?;

        if deleted == 0 {
            warn!("User {} cannot be deleted as it doesn't exist", user_id);
            return Err(self.not_found(user_id));
        }

        info!("User {} deleted", user_id);
        Ok(())
    }

    /// Returns `None` when no user has this id.
    pub fn search(&self, user_id: &str) -> Result<Option<UserRow>> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE user_id = ?1", UserRow::COLUMNS),
                [user_id],
                UserRow::from_row,
            )
            .optional()
        })?;

        match &row {
            Some(_) => info!("User {} found", user_id),
            None => warn!("User {} not found", user_id),
        }
        Ok(row)
    }

    fn not_found(&self, user_id: &str) -> StoreError {
        StoreError::NotFound {
            table: TABLE,
            id: user_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> UserRow {
        UserRow {
            user_id: "bob123".into(),
            user_name: "Bob".into(),
            user_last_name: "Belcher".into(),
            user_email: "bob123@gmail.com".into(),
        }
    }

    #[test]
    fn test_add_then_search() {
        let db = Database::open_in_memory().unwrap();
        let users = UserCollection::new(&db);

        users.add("bob123", "bob123@gmail.com", "Bob", "Belcher").unwrap();
        assert_eq!(users.search("bob123").unwrap(), Some(bob()));
    }

    #[test]
    fn test_add_duplicate_keeps_first() {
        let db = Database::open_in_memory().unwrap();
        let users = UserCollection::new(&db);

        users.add("bob123", "bob123@gmail.com", "Bob", "Belcher").unwrap();
        let err = users
            .add("bob123", "imposter@gmail.com", "Robert", "Smith")
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(users.search("bob123").unwrap(), Some(bob()));
    }

    #[test]
    fn test_modify() {
        let db = Database::open_in_memory().unwrap();
        let users = UserCollection::new(&db);

        users.add("linda123", "linda@gmail.com", "Linda", "Belcher").unwrap();
        users
            .modify("linda123", "linda@belchers.com", "Lin", "Belcher-Smith")
            .unwrap();

        let linda = users.search("linda123").unwrap().unwrap();
        assert_eq!(linda.user_email, "linda@belchers.com");
        assert_eq!(linda.user_name, "Lin");
        assert_eq!(linda.user_last_name, "Belcher-Smith");
    }

    #[test]
    fn test_modify_missing() {
        let db = Database::open_in_memory().unwrap();
        let err = UserCollection::new(&db)
            .modify("gene234", "gene@gmail.com", "Gene", "Belcher")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let users = UserCollection::new(&db);

        assert!(matches!(
            users.delete("tina345").unwrap_err(),
            StoreError::NotFound { .. }
        ));

        users.add("tina345", "tina@gmail.com", "Tina", "Belcher").unwrap();
        users.delete("tina345").unwrap();
        assert!(users.search("tina345").unwrap().is_none());
    }
}
