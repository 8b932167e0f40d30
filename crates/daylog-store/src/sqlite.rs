// ABOUTME: Optional SQLite mirror of log entries in a single `logs` table.
// ABOUTME: Opens a fresh connection per operation; columns are the configured names, all TEXT.

use std::fs;
use std::path::{Path, PathBuf};

use daylog_core::entry::LogEntry;
use rusqlite::{Connection, params_from_iter};
use thiserror::Error;

use crate::table::LogTable;

/// Name of the mirror table.
pub const TABLE_NAME: &str = "logs";

/// Errors that can occur during SQLite mirror operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected {expected} columns, got {actual}")]
    ColumnCount { expected: usize, actual: usize },
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Mirror of appended entries. Holds no connection between calls, so many
/// short-lived processes can share one database file.
#[derive(Debug, Clone)]
pub struct SqliteMirror {
    path: PathBuf,
    columns: Vec<String>,
}

impl SqliteMirror {
    pub fn new(path: PathBuf, columns: Vec<String>) -> Self {
        Self { path, columns }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_table_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            TABLE_NAME,
            cols.join(", ")
        )
    }

    /// Open a connection, creating the file and the table when the file is new.
    fn connect(&self) -> Result<Connection, SqliteError> {
        let is_new = !self.path.exists();
        if is_new && let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        if is_new {
            tracing::debug!("creating log table in {}", self.path.display());
        }
        conn.execute_batch(&self.create_table_sql())?;
        Ok(conn)
    }

    /// Insert one entry as one row.
    pub fn insert(&self, entry: &LogEntry) -> Result<(), SqliteError> {
        let fields = entry.fields();
        if self.columns.len() != fields.len() {
            return Err(SqliteError::ColumnCount {
                expected: fields.len(),
                actual: self.columns.len(),
            });
        }

        let conn = self.connect()?;
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                TABLE_NAME,
                names.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(fields),
        )?;
        Ok(())
    }

    /// Read every mirrored row in insertion order.
    pub fn read_all(&self) -> Result<LogTable, SqliteError> {
        if !self.path.exists() {
            return Ok(LogTable::empty(self.columns.clone()));
        }

        let conn = self.connect()?;
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid ASC",
            names.join(", "),
            TABLE_NAME
        ))?;

        let width = self.columns.len();
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let value: Option<String> = row.get(i)?;
                values.push(value.unwrap_or_default());
            }
            Ok(values)
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(LogTable::new(self.columns.clone(), out))
    }
}
