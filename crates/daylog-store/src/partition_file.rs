// ABOUTME: Append-only day partition file holding delimited log rows under a header row.
// ABOUTME: Publishes a new file with its header and first row in one step; reads back records.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use daylog_core::delimited::{Quoting, RowFormat};
use thiserror::Error;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors that can occur during partition file operations.
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Whether an append created the partition or extended an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Created,
    Appended,
}

/// One day's log file. Rows are written with minimal quoting so embedded
/// delimiters and line breaks never split a record.
#[derive(Debug, Clone)]
pub struct PartitionFile {
    path: PathBuf,
    format: RowFormat,
}

impl PartitionFile {
    pub fn new(path: PathBuf, format: RowFormat) -> Self {
        Self { path, format }
    }

    /// Returns the path to the underlying partition file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn io_err(&self, source: io::Error) -> PartitionError {
        PartitionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one row. When this call creates the file, the header row is
    /// its first line, even with concurrent writers. Parent directories are created.
    pub fn append<H: AsRef<str>, F: AsRef<str>>(
        &self,
        header: &[H],
        fields: &[F],
    ) -> Result<AppendOutcome, PartitionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let row = self.format.render_line(fields, Quoting::Minimal);
        if self.path.exists() {
            return self.append_row(&row);
        }

        // Stage header and row in a sibling file, then publish it with a
        // hard link. The link fails if the target exists, so exactly one
        // writer creates the file and the header is always its first line.
        let mut buf = self.format.render_line(header, Quoting::Minimal);
        buf.push_str(&row);
        let tmp_path = self.staging_path();
        fs::write(&tmp_path, buf.as_bytes()).map_err(|e| self.io_err(e))?;

        let published = fs::hard_link(&tmp_path, &self.path);
        if let Err(e) = fs::remove_file(&tmp_path) {
            tracing::warn!("failed to remove staging file {}: {}", tmp_path.display(), e);
        }

        match published {
            Ok(()) => Ok(AppendOutcome::Created),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => self.append_row(&row),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn append_row(&self, row: &str) -> Result<AppendOutcome, PartitionError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(row.as_bytes()).map_err(|e| self.io_err(e))?;
        Ok(AppendOutcome::Appended)
    }

    /// A staging path next to the partition, unique per process and call.
    fn staging_path(&self) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", name, process::id(), seq))
    }

    /// Read every record in file order, header included if present.
    /// Invalid UTF-8 is replaced rather than failing the read.
    pub fn read_records(&self) -> Result<Vec<Vec<String>>, io::Error> {
        let bytes = fs::read(&self.path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(self.format.parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header() -> Vec<String> {
        ["timestamp", "type", "process_name", "source_code_line", "message", "exec_time"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(ts: &str, message: &str) -> Vec<String> {
        [ts, "message", "tool", "main.rs:1", message, "0"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn header_written_once_on_creation() {
        let dir = TempDir::new().unwrap();
        let file = PartitionFile::new(dir.path().join("nested/app_log_2024_01_10.log"), RowFormat::default());

        assert_eq!(file.append(&header(), &row("20240110090000", "one")).unwrap(), AppendOutcome::Created);
        assert_eq!(file.append(&header(), &row("20240110090001", "two")).unwrap(), AppendOutcome::Appended);

        let records = file.read_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], header());
        assert_eq!(records[1][4], "one");
        assert_eq!(records[2][4], "two");
    }

    #[test]
    fn embedded_breaks_do_not_split_rows() {
        let dir = TempDir::new().unwrap();
        let file = PartitionFile::new(dir.path().join("app_log_2024_01_10.log"), RowFormat::default());
        let message = "failed | retry\nTraceback:\n  at main.rs:9";

        file.append(&header(), &row("20240110090000", message)).unwrap();
        file.append(&header(), &row("20240110090001", "after")).unwrap();

        let records = file.read_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], row("20240110090000", message));
        assert_eq!(records[2], row("20240110090001", "after"));
    }

    #[test]
    fn append_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the open fail.
        let path = dir.path().join("taken");
        fs::create_dir_all(path.join("child")).unwrap();
        let file = PartitionFile::new(path.clone(), RowFormat::default());

        let err = file.append(&header(), &row("20240110090000", "x")).unwrap_err();
        assert!(err.to_string().contains("taken"), "got: {}", err);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let file = PartitionFile::new(dir.path().join("absent.log"), RowFormat::default());
        assert!(!file.exists());
        assert_eq!(file.read_records().unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn concurrent_first_appends_keep_header_first() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let dir = TempDir::new().unwrap();
        for round in 0..50 {
            let path = dir.path().join(format!("app_log_2024_01_{:02}.log", round));
            let writers = 8;
            let barrier = Arc::new(Barrier::new(writers));

            let handles: Vec<_> = (0..writers)
                .map(|t| {
                    let barrier = Arc::clone(&barrier);
                    let file = PartitionFile::new(path.clone(), RowFormat::default());
                    thread::spawn(move || {
                        barrier.wait();
                        file.append(&header(), &row("20240110090000", &format!("t{}", t)))
                            .unwrap()
                    })
                })
                .collect();
            let created = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|o| *o == AppendOutcome::Created)
                .count();
            assert_eq!(created, 1);

            let records = PartitionFile::new(path, RowFormat::default()).read_records().unwrap();
            assert_eq!(records.len(), writers + 1);
            assert_eq!(records[0], header(), "round {}", round);
            assert!(records[1..].iter().all(|r| *r != header()));
        }

        // No staging files are left behind.
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
