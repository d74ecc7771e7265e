use std::collections::VecDeque;

use rusqlite::params;
use tracing::{debug, info, warn};

use crate::error::{Constraint, OptionalExt, constraint_of};
use crate::models::StatusRow;
use crate::{Database, Result, StoreError};

const TABLE: &str = "status";

/// Rows fetched per round trip by a [`StatusCursor`].
const PAGE_SIZE: usize = 32;

/// CRUD and search access to the `status` table.
pub struct UserStatusCollection<'db> {
    db: &'db Database,
}

impl<'db> UserStatusCollection<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Fails on a duplicate `status_id` or an unknown `user_id`.
    pub fn add(&self, status_id: &str, user_id: &str, status_text: &str) -> Result<()> {
        let inserted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO status (status_id, user_id, status_text) VALUES (?1, ?2, ?3)",
                params![status_id, user_id, status_text],
            ))
        })?;

        match inserted {
            Ok(_) => {
                info!("Status {} added for user {}", status_id, user_id);
                Ok(())
            }
            Err(e) => Err(self.rejected(e, status_id, user_id)),
        }
    }

    pub fn modify(&self, status_id: &str, user_id: &str, status_text: &str) -> Result<()> {
        let updated = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE status SET user_id = ?2, status_text = ?3 WHERE status_id = ?1",
                params![status_id, user_id, status_text],
            ))
        })?;

        match updated {
            Ok(0) => {
                warn!("Status {} cannot be modified as it doesn't exist", status_id);
                Err(self.not_found(status_id))
            }
            Ok(_) => {
                info!(
                    "Status {} modified to user {} and text {:?}",
                    status_id, user_id, status_text
                );
                Ok(())
            }
            Err(e) => Err(self.rejected(e, status_id, user_id)),
        }
    }

    pub fn delete(&self, status_id: &str) -> Result<()> {
        let deleted = self.db.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM status WHERE status_id = ?1", [status_id])?)
        })?;

        if deleted == 0 {
            warn!("Status {} cannot be deleted as it doesn't exist", status_id);
            return Err(self.not_found(status_id));
        }

        info!("Status {} deleted", status_id);
        Ok(())
    }

    /// Returns `None` when no status has this id.
    pub fn search(&self, status_id: &str) -> Result<Option<StatusRow>> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM status WHERE status_id = ?1", StatusRow::COLUMNS),
                [status_id],
                StatusRow::from_row,
            )
            .optional()
        })?;

        match &row {
            Some(_) => info!("Status {} found", status_id),
            None => warn!("Status {} not found", status_id),
        }
        Ok(row)
    }

    /// Every status posted by `user_id`, ordered by status id. Each call
    /// starts a fresh cursor.
    pub fn search_all_by_user(&self, user_id: &str) -> StatusCursor<'db> {
        info!("Searching all statuses of user {}", user_id);
        StatusCursor::new(self.db, StatusFilter::ByUser(user_id.to_string()))
    }

    /// Statuses whose text contains `needle`, compared case-sensitively.
    pub fn filter_by_text(&self, needle: &str) -> StatusCursor<'db> {
        info!("Filtering statuses containing {:?}", needle);
        StatusCursor::new(self.db, StatusFilter::TextContains(needle.to_string()))
    }

    pub fn count_by_user(&self, user_id: &str) -> Result<usize> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM status WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    fn rejected(&self, err: rusqlite::Error, status_id: &str, user_id: &str) -> StoreError {
        match constraint_of(&err) {
            Some(Constraint::Unique) => {
                warn!("Status {} already exists", status_id);
                StoreError::DuplicateKey {
                    table: TABLE,
                    id: status_id.to_string(),
                }
            }
            Some(Constraint::ForeignKey) => {
                warn!("Status {} references missing user {}", status_id, user_id);
                StoreError::ForeignKeyViolation {
                    user_id: user_id.to_string(),
                }
            }
            None => err.into(),
        }
    }

    fn not_found(&self, status_id: &str) -> StoreError {
        StoreError::NotFound {
            table: TABLE,
            id: status_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum StatusFilter {
    ByUser(String),
    TextContains(String),
}

impl StatusFilter {
    fn predicate(&self) -> &'static str {
        match self {
            StatusFilter::ByUser(_) => "user_id = ?1",
            StatusFilter::TextContains(_) => "instr(status_text, ?1) > 0",
        }
    }

    fn value(&self) -> &str {
        match self {
            StatusFilter::ByUser(v) | StatusFilter::TextContains(v) => v,
        }
    }
}

/// Lazy, finite iterator over matching statuses.
///
/// Rows are pulled a page at a time with keyset pagination on `status_id`,
/// so no statement stays open between calls to `next`. The cursor is fused:
/// once it returns `None` or an error it keeps returning `None`.
pub struct StatusCursor<'db> {
    db: &'db Database,
    filter: StatusFilter,
    page: VecDeque<StatusRow>,
    last_id: Option<String>,
    exhausted: bool,
}

impl<'db> StatusCursor<'db> {
    fn new(db: &'db Database, filter: StatusFilter) -> Self {
        Self {
            db,
            filter,
            page: VecDeque::new(),
            last_id: None,
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let sql = format!(
            "SELECT {} FROM status
             WHERE {} AND (?2 IS NULL OR status_id > ?2)
             ORDER BY status_id
             LIMIT ?3",
            StatusRow::COLUMNS,
            self.filter.predicate()
        );

        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![self.filter.value(), self.last_id.as_deref(), PAGE_SIZE as i64],
                    StatusRow::from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        debug!("Status cursor fetched {} rows", rows.len());
        if rows.len() < PAGE_SIZE {
            self.exhausted = true;
        }
        if let Some(last) = rows.last() {
            self.last_id = Some(last.status_id.clone());
        }
        self.page.extend(rows);
        Ok(())
    }
}

impl Iterator for StatusCursor<'_> {
    type Item = Result<StatusRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.page.pop_front().map(Ok)
    }
}

impl std::iter::FusedIterator for StatusCursor<'_> {}
