// ABOUTME: Day partition naming: timestamp and day-key encodings and partition file paths.
// ABOUTME: Pure and deterministic; no filesystem access happens here.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

/// Encoding of `LogEntry::timestamp`, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Day key used by query operations, e.g. `20240110`.
pub const DAY_KEY_FORMAT: &str = "%Y%m%d";

/// Date component of a partition file name, e.g. `2024_01_10`.
pub const FILE_DATE_FORMAT: &str = "%Y_%m_%d";

fn all_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Render a timestamp as `YYYYMMDDHHMMSS`.
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a strict 14-digit `YYYYMMDDHHMMSS` timestamp.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if !all_digits(s, 14) {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Render a date as its `YYYYMMDD` day key.
pub fn day_key(date: &NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a strict 8-digit `YYYYMMDD` day key.
pub fn parse_day_key(s: &str) -> Option<NaiveDate> {
    if !all_digits(s, 8) {
        return None;
    }
    NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).ok()
}

/// Convert a `YYYYMMDD` day key into the `YYYY_MM_DD` form used in file names.
pub fn day_key_to_file_date(key: &str) -> Option<String> {
    parse_day_key(key).map(|date| file_date(&date))
}

/// Render a date as `YYYY_MM_DD`.
pub fn file_date(date: &NaiveDate) -> String {
    date.format(FILE_DATE_FORMAT).to_string()
}

/// File name of the partition for `date`: `<prefix>_log_<YYYY_MM_DD>.log`.
pub fn partition_file_name(prefix: &str, date: &NaiveDate) -> String {
    format!("{}_log_{}.log", prefix, file_date(date))
}

/// Full path of the partition for `date` under `base`.
pub fn partition_path(base: &Path, prefix: &str, date: &NaiveDate) -> PathBuf {
    base.join(partition_file_name(prefix, date))
}

/// Every calendar day from `start` to `end`, inclusive. Empty when `start > end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}
