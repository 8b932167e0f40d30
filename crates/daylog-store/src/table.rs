// ABOUTME: Structured query result: named columns plus rows of text fields in file order.
// ABOUTME: Serializable for dashboards and convertible back into LogEntry values.

use daylog_core::entry::{COLUMN_COUNT, LogEntry};
use daylog_core::severity::Severity;
use serde::{Deserialize, Serialize};

/// Rows returned by a query, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LogTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self::new(columns, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A new table holding rows `[start, end)`, clamped to the row count.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        Self::new(self.columns.clone(), self.rows[start..end].to_vec())
    }

    /// Values of one column by name, one per row. Short rows yield `None`.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str))
                .collect(),
        )
    }

    /// Rows that carry all six fields and a known severity, as entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.rows
            .iter()
            .filter(|row| row.len() == COLUMN_COUNT)
            .filter_map(|row| {
                let severity: Severity = row[1].parse().ok()?;
                Some(LogEntry {
                    timestamp: row[0].clone(),
                    severity,
                    process_name: row[2].clone(),
                    code_location: row[3].clone(),
                    message: row[4].clone(),
                    elapsed_seconds: row[5].clone(),
                })
            })
            .collect()
    }
}
