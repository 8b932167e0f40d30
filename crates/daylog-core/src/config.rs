// ABOUTME: Configuration for the daylog engines, loaded from defaults, YAML, or environment variables.
// ABOUTME: Validates delimiter, quote, column list, and page size before any engine uses them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delimited::RowFormat;
use crate::entry::COLUMN_COUNT;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Default column names written as the header row.
pub const DEFAULT_COLUMNS: [&str; COLUMN_COUNT] = [
    "timestamp",
    "type",
    "process_name",
    "source_code_line",
    "message",
    "exec_time",
];

/// One outbound notification destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Destination {
    pub enabled: bool,
    pub url: Option<String>,
}

impl Destination {
    /// The URL to notify, if this destination is enabled and has one.
    pub fn active_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Engine configuration. Missing YAML keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Global gate; when false every append is a no-op.
    pub enabled: bool,
    pub log_path: PathBuf,
    pub prefix: String,
    pub delimiter: char,
    pub quote_char: char,
    pub columns: Vec<String>,
    pub page_size: usize,
    pub file_storage: bool,
    pub database_storage: bool,
    /// Defaults to `<log_path>/<prefix>.db` when unset.
    pub database_path: Option<PathBuf>,
    pub terminal_output: bool,
    pub telegram: Destination,
    pub slack: Destination,
    pub url: Destination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: PathBuf::from("logs"),
            prefix: "daylog".to_string(),
            delimiter: '|',
            quote_char: '"',
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            page_size: 100,
            file_storage: true,
            database_storage: false,
            database_path: None,
            terminal_output: false,
            telegram: Destination::default(),
            slack: Destination::default(),
            url: Destination::default(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_char(key: &str, value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl LogConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - DAYLOG_ENABLED, DAYLOG_PATH, DAYLOG_PREFIX
    /// - DAYLOG_DELIMITER, DAYLOG_QUOTE_CHAR, DAYLOG_COLUMNS (comma separated)
    /// - DAYLOG_PAGE_SIZE
    /// - DAYLOG_FILE_STORAGE, DAYLOG_DATABASE_STORAGE, DAYLOG_DATABASE_PATH
    /// - DAYLOG_TERMINAL_OUTPUT
    /// - DAYLOG_TELEGRAM_URL / DAYLOG_TELEGRAM_ENABLED, DAYLOG_SLACK_URL /
    ///   DAYLOG_SLACK_ENABLED, DAYLOG_NOTIFY_URL / DAYLOG_NOTIFY_ENABLED
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup using the
    /// `DAYLOG_*` key names. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DAYLOG_ENABLED") {
            config.enabled = parse_bool(&v);
        }
        if let Some(v) = get("DAYLOG_PATH") {
            config.log_path = PathBuf::from(v);
        }
        if let Some(v) = get("DAYLOG_PREFIX") {
            config.prefix = v;
        }
        if let Some(v) = get("DAYLOG_DELIMITER") {
            config.delimiter = parse_char("DAYLOG_DELIMITER", &v)?;
        }
        if let Some(v) = get("DAYLOG_QUOTE_CHAR") {
            config.quote_char = parse_char("DAYLOG_QUOTE_CHAR", &v)?;
        }
        if let Some(v) = get("DAYLOG_COLUMNS") {
            config.columns = v.split(',').map(|c| c.trim().to_string()).collect();
        }
        if let Some(v) = get("DAYLOG_PAGE_SIZE") {
            config.page_size = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DAYLOG_PAGE_SIZE".to_string(),
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("DAYLOG_FILE_STORAGE") {
            config.file_storage = parse_bool(&v);
        }
        if let Some(v) = get("DAYLOG_DATABASE_STORAGE") {
            config.database_storage = parse_bool(&v);
        }
        if let Some(v) = get("DAYLOG_DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("DAYLOG_TERMINAL_OUTPUT") {
            config.terminal_output = parse_bool(&v);
        }

        for (name, dest) in [
            ("TELEGRAM", &mut config.telegram),
            ("SLACK", &mut config.slack),
            ("NOTIFY", &mut config.url),
        ] {
            if let Some(url) = get(&format!("DAYLOG_{}_URL", name)) {
                dest.url = Some(url);
                dest.enabled = true;
            }
            if let Some(v) = get(&format!("DAYLOG_{}_ENABLED", name)) {
                dest.enabled = parse_bool(&v);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document. Keys are the field names of this struct.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject settings that would make stored rows unreadable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.columns.len() != COLUMN_COUNT {
            return Err(ConfigError::Invalid(format!(
                "columns must name exactly {} fields, got {}",
                COLUMN_COUNT,
                self.columns.len()
            )));
        }
        if self.delimiter == self.quote_char {
            return Err(ConfigError::Invalid(
                "delimiter and quote_char must differ".to_string(),
            ));
        }
        for (key, c) in [("delimiter", self.delimiter), ("quote_char", self.quote_char)] {
            if c == '\n' || c == '\r' {
                return Err(ConfigError::Invalid(format!("{} cannot be a line break", key)));
            }
        }
        Ok(())
    }

    /// The delimiter and quote pair used for stored rows.
    pub fn row_format(&self) -> RowFormat {
        RowFormat::new(self.delimiter, self.quote_char)
    }

    /// Resolved path of the SQLite mirror.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.log_path.join(format!("{}.db", self.prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_loads_defaults() {
        let config = LogConfig::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.enabled);
        assert_eq!(config.delimiter, '|');
        assert_eq!(config.quote_char, '"');
        assert_eq!(config.page_size, 100);
        assert_eq!(config.columns, DEFAULT_COLUMNS);
        assert!(config.file_storage);
        assert!(!config.database_storage);
        assert!(!config.terminal_output);
        assert_eq!(config.database_path(), PathBuf::from("logs/daylog.db"));
        assert!(config.telegram.active_url().is_none());
    }

    #[test]
    fn config_applies_overrides() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("DAYLOG_ENABLED", "no"),
            ("DAYLOG_PATH", "/tmp/worktwins"),
            ("DAYLOG_PREFIX", "worktwins"),
            ("DAYLOG_DELIMITER", ";"),
            ("DAYLOG_PAGE_SIZE", "25"),
            ("DAYLOG_DATABASE_STORAGE", "TRUE"),
            ("DAYLOG_SLACK_URL", "http://127.0.0.1:8000/slack"),
            ("DAYLOG_TELEGRAM_URL", "http://127.0.0.1:8000/telegram"),
            ("DAYLOG_TELEGRAM_ENABLED", "0"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.page_size, 25);
        assert!(config.database_storage);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/worktwins/worktwins.db")
        );
        assert_eq!(config.slack.active_url(), Some("http://127.0.0.1:8000/slack"));
        assert!(config.telegram.active_url().is_none());
    }

    #[test]
    fn config_rejects_bad_values() {
        let err = LogConfig::from_lookup(lookup_from(&[("DAYLOG_PAGE_SIZE", "ten")])).unwrap_err();
        assert!(err.to_string().contains("DAYLOG_PAGE_SIZE"), "got: {}", err);

        let err = LogConfig::from_lookup(lookup_from(&[("DAYLOG_DELIMITER", "||")])).unwrap_err();
        assert!(err.to_string().contains("DAYLOG_DELIMITER"), "got: {}", err);

        assert!(LogConfig::from_lookup(lookup_from(&[("DAYLOG_PAGE_SIZE", "0")])).is_err());
        assert!(LogConfig::from_lookup(lookup_from(&[("DAYLOG_COLUMNS", "a,b,c")])).is_err());
        assert!(LogConfig::from_lookup(lookup_from(&[("DAYLOG_DELIMITER", "\"")])).is_err());
    }

    #[test]
    fn config_parses_yaml_with_partial_keys() {
        let config = LogConfig::from_yaml_str(
            "prefix: mylogs\nlog_path: /srv/logs\ndelimiter: ','\nurl:\n  enabled: true\n  url: https://hooks.example/log\n",
        )
        .unwrap();

        assert_eq!(config.prefix, "mylogs");
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.page_size, 100);
        assert_eq!(config.url.active_url(), Some("https://hooks.example/log"));
    }

    #[test]
    fn config_reads_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("daylog.yaml");
        fs::write(&path, "page_size: 7\nterminal_output: true\n").unwrap();

        let config = LogConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.page_size, 7);
        assert!(config.terminal_output);
    }
}
