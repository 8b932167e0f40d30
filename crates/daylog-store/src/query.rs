// ABOUTME: Read path over day partitions: paging, line ranges, page counts, and time-range scans.
// ABOUTME: Argument errors are raised; absent partitions are raised except where a scan skips them.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use daylog_core::clock::{Clock, SystemClock};
use daylog_core::config::LogConfig;
use daylog_core::partition::{self, parse_day_key, parse_timestamp};
use thiserror::Error;

use crate::partition_file::PartitionFile;
use crate::table::LogTable;

/// Errors returned by query operations.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("log partition not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no logs have been written today: {}", .0.display())]
    NoLogs(PathBuf),
}

/// Executes queries against the partition files described by a `LogConfig`.
pub struct QueryEngine {
    config: LogConfig,
    clock: Arc<dyn Clock>,
}

impl QueryEngine {
    /// Create a query engine reading "today" from the system clock.
    pub fn new(config: LogConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LogConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    fn partition(&self, date: &NaiveDate) -> PartitionFile {
        PartitionFile::new(
            partition::partition_path(&self.config.log_path, &self.config.prefix, date),
            self.config.row_format(),
        )
    }

    fn parse_date(&self, date: &str) -> Result<NaiveDate, QueryError> {
        parse_day_key(date).ok_or_else(|| {
            QueryError::InvalidArgument(format!("date must be YYYYMMDD, got {:?}", date))
        })
    }

    fn total_pages_for(&self, rows: usize) -> Result<usize, QueryError> {
        if self.config.page_size == 0 {
            return Err(QueryError::InvalidArgument(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(rows.div_ceil(self.config.page_size))
    }

    /// Load one partition. The first record is treated as the header only
    /// when it matches the configured columns exactly. Read failures other
    /// than absence are reported and yield an empty table.
    fn load(&self, date: &NaiveDate) -> Result<LogTable, QueryError> {
        let file = self.partition(date);
        let path = file.path().to_path_buf();
        if !file.exists() {
            return Err(QueryError::NotFound(path));
        }

        let mut records = match file.read_records() {
            Ok(records) => records,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(QueryError::NotFound(path));
            }
            Err(e) => {
                tracing::warn!("failed to read log partition {}: {}", path.display(), e);
                return Ok(LogTable::empty(self.config.columns.clone()));
            }
        };

        let columns = if records.first() == Some(&self.config.columns) {
            records.remove(0)
        } else {
            self.config.columns.clone()
        };

        Ok(LogTable::new(columns, records))
    }

    /// Read a whole partition by `YYYYMMDD` date, header excluded.
    pub fn read_partition(&self, date: &str) -> Result<LogTable, QueryError> {
        let date = self.parse_date(date)?;
        self.load(&date)
    }

    /// One page of today's partition. Pages are numbered from 1.
    pub fn get_page(&self, page: usize) -> Result<LogTable, QueryError> {
        let table = self.load(&self.today())?;
        let total_pages = self.total_pages_for(table.len())?;

        if page < 1 || page > total_pages {
            return Err(QueryError::InvalidArgument(format!(
                "page {} is out of range 1..={}",
                page, total_pages
            )));
        }

        let size = self.config.page_size;
        Ok(table.slice((page - 1) * size, page * size))
    }

    /// Data rows `start_line..=end_line` (1-based) of the partition for `date`.
    pub fn get_range(
        &self,
        date: &str,
        start_line: usize,
        end_line: usize,
    ) -> Result<LogTable, QueryError> {
        let date = self.parse_date(date)?;
        let table = self.load(&date)?;

        if start_line < 1 || end_line > table.len() || start_line > end_line {
            return Err(QueryError::InvalidArgument(format!(
                "line range {}..={} is invalid for {} rows",
                start_line,
                end_line,
                table.len()
            )));
        }

        Ok(table.slice(start_line - 1, end_line))
    }

    /// Number of pages in a partition. Without a date this is today's
    /// partition, and its absence is a `NoLogs` error. An absent partition
    /// for an explicit date has zero pages.
    pub fn total_pages(&self, date: Option<&str>) -> Result<usize, QueryError> {
        match date {
            None => match self.load(&self.today()) {
                Ok(table) => self.total_pages_for(table.len()),
                Err(QueryError::NotFound(path)) => Err(QueryError::NoLogs(path)),
                Err(e) => Err(e),
            },
            Some(date) => {
                let date = self.parse_date(date)?;
                match self.load(&date) {
                    Ok(table) => self.total_pages_for(table.len()),
                    Err(QueryError::NotFound(_)) => Ok(0),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Rows whose timestamp lies in `[t1, t2]`, both `YYYYMMDDHHMMSS`,
    /// gathered from every day partition between the two dates in day order.
    /// Missing partitions are skipped.
    pub fn get_between(&self, t1: &str, t2: &str) -> Result<LogTable, QueryError> {
        let start = parse_timestamp(t1).ok_or_else(|| {
            QueryError::InvalidArgument(format!("start must be YYYYMMDDHHMMSS, got {:?}", t1))
        })?;
        let end = parse_timestamp(t2).ok_or_else(|| {
            QueryError::InvalidArgument(format!("end must be YYYYMMDDHHMMSS, got {:?}", t2))
        })?;
        if start > end {
            return Err(QueryError::InvalidArgument(format!(
                "start {} is after end {}",
                t1, t2
            )));
        }

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for day in partition::days_between(start.date(), end.date()) {
            match self.load(&day) {
                Ok(table) => {
                    columns.get_or_insert(table.columns);
                    rows.extend(table.rows);
                }
                Err(QueryError::NotFound(path)) => {
                    tracing::info!("no log partition for {}, skipping: {}", day, path.display());
                }
                Err(e) => return Err(e),
            }
        }

        rows.retain(|row| {
            row.first()
                .and_then(|ts| parse_timestamp(ts))
                .is_some_and(|ts| start <= ts && ts <= end)
        });

        Ok(LogTable::new(
            columns.unwrap_or_else(|| self.config.columns.clone()),
            rows,
        ))
    }
}
