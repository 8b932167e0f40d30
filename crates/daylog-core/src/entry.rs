// ABOUTME: The LogEntry value object: one classified event with its six stored fields.
// ABOUTME: Also renders entries as delimited rows and formats elapsed time and call sites.

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::delimited::{Quoting, RowFormat};
use crate::severity::Severity;

/// Number of stored columns; every row in a file or table has exactly this many.
pub const COLUMN_COUNT: usize = 6;

/// Code location recorded when the call site cannot be determined.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Elapsed-time text for the first entry a process emits.
pub const FIRST_ELAPSED: &str = "0";

/// One logged event. Field order matches the stored column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub process_name: String,
    pub code_location: String,
    pub message: String,
    pub elapsed_seconds: String,
}

impl LogEntry {
    /// The six field values in stored order.
    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            self.timestamp.as_str(),
            self.severity.as_str(),
            self.process_name.as_str(),
            self.code_location.as_str(),
            self.message.as_str(),
            self.elapsed_seconds.as_str(),
        ]
    }

    /// Render as a single row, no line terminator.
    pub fn render(&self, format: &RowFormat, quoting: Quoting) -> String {
        format.render(&self.fields(), quoting)
    }
}

/// Format a `file:line` location using only the file's base name.
pub fn format_location(file: &str, line: u32) -> String {
    let name = Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    format!("{}:{}", name, line)
}

/// Format a delta as decimal seconds, e.g. `2.5` or `1.0`. Whole seconds
/// keep their decimal point. `None` means no previous entry.
pub fn format_elapsed(delta: Option<TimeDelta>) -> String {
    let Some(delta) = delta else {
        return FIRST_ELAPSED.to_string();
    };
    let text = match delta.num_microseconds() {
        Some(micros) => format!("{}", micros as f64 / 1_000_000.0),
        None => format!("{}", delta.num_seconds()),
    };
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}
