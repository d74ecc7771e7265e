//! Bulk loading of users and statuses from comma-separated files.
//!
//! A load is all-or-nothing. The whole file is parsed before anything is
//! written, and the inserts run inside one transaction. Rows whose id is
//! already taken are skipped rather than overwritten; any other constraint
//! failure rolls the batch back.

use std::fs;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::error::{Constraint, constraint_of};
use crate::models::{StatusRow, UserRow};
use crate::{Database, Result, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    /// Rows left alone because their id already existed.
    pub skipped: usize,
}

/// A row type that can be read from one line of a load file.
trait LoadRecord: Sized {
    const KIND: &'static str;
    const ARITY: usize;

    fn from_fields(fields: &[&str]) -> Self;

    fn id(&self) -> &str;

    /// Inserts unless the id is taken. Returns whether a row was written.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<bool>;

    fn conflict(&self, err: rusqlite::Error) -> StoreError {
        err.into()
    }
}

impl LoadRecord for UserRow {
    const KIND: &'static str = "user";
    const ARITY: usize = 4;

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            user_id: fields[0].to_string(),
            user_name: fields[1].to_string(),
            user_last_name: fields[2].to_string(),
            user_email: fields[3].to_string(),
        }
    }

    fn id(&self) -> &str {
        &self.user_id
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "INSERT INTO users (user_id, user_name, user_last_name, user_email)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO NOTHING",
            params![self.user_id, self.user_name, self.user_last_name, self.user_email],
        )?;
        Ok(changed > 0)
    }
}

impl LoadRecord for StatusRow {
    const KIND: &'static str = "status";
    const ARITY: usize = 3;

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            status_id: fields[0].to_string(),
            user_id: fields[1].to_string(),
            status_text: fields[2].to_string(),
        }
    }

    fn id(&self) -> &str {
        &self.status_id
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "INSERT INTO status (status_id, user_id, status_text)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(status_id) DO NOTHING",
            params![self.status_id, self.user_id, self.status_text],
        )?;
        Ok(changed > 0)
    }

    fn conflict(&self, err: rusqlite::Error) -> StoreError {
        match constraint_of(&err) {
            Some(Constraint::ForeignKey) => StoreError::ForeignKeyViolation {
                user_id: self.user_id.clone(),
            },
            _ => err.into(),
        }
    }
}

pub struct BulkLoader<'db> {
    db: &'db Database,
}

impl<'db> BulkLoader<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Loads `user_id,user_name,user_last_name,user_email` rows.
    pub fn load_users(&self, path: &Path) -> Result<LoadReport> {
        self.load::<UserRow>(path)
    }

    /// Loads `status_id,user_id,status_text` rows.
    pub fn load_statuses(&self, path: &Path) -> Result<LoadReport> {
        self.load::<StatusRow>(path)
    }

    fn load<R: LoadRecord>(&self, path: &Path) -> Result<LoadReport> {
        if !path.is_file() {
            warn!("{} does not exist", path.display());
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)?;
        let records = parse::<R>(&contents).inspect_err(|e| {
            warn!("Rejected {} file {}: {}", R::KIND, path.display(), e);
        })?;
        debug!("Parsed {} {} rows from {}", records.len(), R::KIND, path.display());

        let report = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut report = LoadReport::default();

            for record in &records {
                match record.insert(&tx) {
                    Ok(true) => report.inserted += 1,
                    Ok(false) => {
                        debug!("Skipping existing {} {}", R::KIND, record.id());
                        report.skipped += 1;
                    }
                    Err(e) => {
                        warn!("Aborting {} load at {}: {}", R::KIND, record.id(), e);
                        return Err(record.conflict(e));
                    }
                }
            }

            tx.commit()?;
            Ok(report)
        })?;

        info!(
            "Loaded {} file {}: {} inserted, {} skipped",
            R::KIND,
            path.display(),
            report.inserted,
            report.skipped
        );
        Ok(report)
    }
}

/// Splits every line after the header into records. Blank lines are ignored.
fn parse<R: LoadRecord>(contents: &str) -> Result<Vec<R>> {
    let mut records = Vec::new();

    for (idx, line) in contents.lines().enumerate().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != R::ARITY {
            return Err(StoreError::MalformedInput {
                line: idx + 1,
                reason: format!("expected {} columns, found {}", R::ARITY, fields.len()),
            });
        }
        if let Some(col) = fields.iter().position(|f| f.is_empty()) {
            return Err(StoreError::MalformedInput {
                line: idx + 1,
                reason: format!("column {} is empty", col + 1),
            });
        }

        records.push(R::from_fields(&fields));
    }

    Ok(records)
}
