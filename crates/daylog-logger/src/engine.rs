// ABOUTME: The append engine: builds classified entries and writes them to file, database, and terminal.
// ABOUTME: Owns the process-local elapsed-time state and never propagates write or notify failures.

use std::backtrace::Backtrace;
use std::error::Error;
use std::io::{self, Write};
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use daylog_core::clock::{Clock, SystemClock};
use daylog_core::config::LogConfig;
use daylog_core::delimited::Quoting;
use daylog_core::entry::{self, LogEntry, UNKNOWN_LOCATION};
use daylog_core::partition::{self, format_timestamp, parse_timestamp};
use daylog_core::severity::{Severity, classify};
use daylog_store::{PartitionFile, SqliteMirror};

use crate::notify::{HttpNotifier, Notification, Notifier, NotifyTarget};

/// Separator placed between a message and appended diagnostic detail.
pub const TRACEBACK_MARKER: &str = "\nTraceback:\n";

/// Per-call switches: which destinations to notify, whether to attach a
/// backtrace, and overrides for the severity and terminal echo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOptions {
    pub telegram: bool,
    pub slack: bool,
    pub url: bool,
    pub trace: bool,
    /// Replaces the keyword classification when set.
    pub severity: Option<Severity>,
    /// Replaces `terminal_output` for this entry when set.
    pub console: Option<bool>,
}

impl AppendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn telegram(mut self) -> Self {
        self.telegram = true;
        self
    }

    pub fn slack(mut self) -> Self {
        self.slack = true;
        self
    }

    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    pub fn trace(mut self) -> Self {
        self.trace = true;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn console(mut self, echo: bool) -> Self {
        self.console = Some(echo);
        self
    }

    fn requested(&self) -> impl Iterator<Item = NotifyTarget> + '_ {
        NotifyTarget::ALL.into_iter().filter(|target| match target {
            NotifyTarget::Telegram => self.telegram,
            NotifyTarget::Slack => self.slack,
            NotifyTarget::Url => self.url,
        })
    }
}

fn location_text(location: Option<&Location<'_>>) -> String {
    location
        .map(|loc| entry::format_location(loc.file(), loc.line()))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// Name of the running executable without extension.
fn current_process_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Writes log entries. One instance per process; the elapsed-time state
/// lives here and is never persisted.
pub struct AppendEngine {
    config: LogConfig,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    echo: Box<dyn Write + Send>,
    process_name: String,
    last_emission: Option<NaiveDateTime>,
}

impl AppendEngine {
    /// Create an engine using the system clock, HTTP notifications, and stdout echo.
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            notifier: Box::new(HttpNotifier::default()),
            echo: Box::new(io::stdout()),
            process_name: current_process_name(),
            last_emission: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_echo(mut self, echo: Box<dyn Write + Send>) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Log a message from the caller's source location.
    #[track_caller]
    pub fn append(&mut self, message: &str) {
        self.append_at(message, AppendOptions::default(), Some(Location::caller()));
    }

    /// Log a message with notification and trace options.
    #[track_caller]
    pub fn append_with(&mut self, message: &str, options: AppendOptions) {
        self.append_at(message, options, Some(Location::caller()));
    }

    /// Log a message followed by an error and its chain of causes.
    #[track_caller]
    pub fn append_error(&mut self, message: &str, error: &dyn Error) {
        self.append_error_with(message, error, AppendOptions::default());
    }

    /// `append_error` with notification and override options. The error
    /// chain is the detail, so `trace` is ignored.
    #[track_caller]
    pub fn append_error_with(&mut self, message: &str, error: &dyn Error, options: AppendOptions) {
        let location = Location::caller();
        if !self.config.enabled {
            return;
        }

        let mut detail = format!("{}", error);
        let mut source = error.source();
        while let Some(cause) = source {
            detail.push_str(&format!("\nCaused by: {}", cause));
            source = cause.source();
        }

        let (now, elapsed) = self.tick();
        let entry = self.build_entry(
            &now,
            elapsed,
            options.severity.unwrap_or_else(|| classify(message)),
            message,
            Some(&detail),
            location_text(Some(location)),
        );
        self.emit(entry, now, options);
    }

    /// Log a message with an explicit call site. `None` records `Unknown`.
    pub fn append_at(
        &mut self,
        message: &str,
        options: AppendOptions,
        location: Option<&Location<'_>>,
    ) {
        if !self.config.enabled {
            return;
        }

        let (now, elapsed) = self.tick();
        let trace = options
            .trace
            .then(|| Backtrace::force_capture().to_string());
        let entry = self.build_entry(
            &now,
            elapsed,
            options.severity.unwrap_or_else(|| classify(message)),
            message,
            trace.as_deref(),
            location_text(location),
        );
        self.emit(entry, now, options);
    }

    /// Read the clock, returning now and the elapsed text since the
    /// previous entry, and record now as the last emission.
    fn tick(&mut self) -> (NaiveDateTime, String) {
        let now = self.clock.now();
        let elapsed = entry::format_elapsed(self.last_emission.map(|last| now - last));
        self.last_emission = Some(now);
        (now, elapsed)
    }

    fn build_entry(
        &self,
        now: &NaiveDateTime,
        elapsed_seconds: String,
        severity: Severity,
        message: &str,
        detail: Option<&str>,
        code_location: String,
    ) -> LogEntry {
        let mut message = message.to_string();
        if let Some(detail) = detail {
            message.push_str(TRACEBACK_MARKER);
            message.push_str(detail);
        }

        LogEntry {
            timestamp: format_timestamp(now),
            severity,
            process_name: self.process_name.clone(),
            code_location,
            message,
            elapsed_seconds,
        }
    }

    fn emit(&mut self, entry: LogEntry, now: NaiveDateTime, options: AppendOptions) {
        let date = match parse_timestamp(&entry.timestamp) {
            Some(ts) => ts.date(),
            None => {
                self.report_bad_timestamp(&entry, &now, options);
                now.date()
            }
        };
        self.write(&entry, &date, options);
        self.notify(&entry, options);
    }

    /// Record a diagnostic entry for a timestamp this engine failed to
    /// read back. Written straight to the stores to avoid re-validation.
    fn report_bad_timestamp(
        &mut self,
        original: &LogEntry,
        now: &NaiveDateTime,
        options: AppendOptions,
    ) {
        tracing::error!("invalid timestamp format: {}", original.timestamp);
        let message = format!("Invalid timestamp format: {}", original.timestamp);
        let diagnostic = self.build_entry(
            now,
            original.elapsed_seconds.clone(),
            Severity::Error,
            &message,
            None,
            original.code_location.clone(),
        );
        self.write(&diagnostic, &now.date(), options);
    }

    fn write(&mut self, entry: &LogEntry, date: &NaiveDate, options: AppendOptions) {
        if self.config.file_storage {
            let path = partition::partition_path(&self.config.log_path, &self.config.prefix, date);
            let file = PartitionFile::new(path, self.config.row_format());
            if let Err(e) = file.append(&self.config.columns, &entry.fields()) {
                tracing::error!("failed to write to log file: {}", e);
            }
        }

        if self.config.database_storage {
            let mirror = SqliteMirror::new(self.config.database_path(), self.config.columns.clone());
            if let Err(e) = mirror.insert(entry) {
                tracing::error!("failed to write to log database: {}", e);
            }
        }

        if options.console.unwrap_or(self.config.terminal_output) {
            let line = entry.render(&self.config.row_format(), Quoting::Always);
            if let Err(e) = writeln!(self.echo, "{}", line).and_then(|_| self.echo.flush()) {
                tracing::warn!("failed to echo log entry: {}", e);
            }
        }
    }

    fn notify(&self, entry: &LogEntry, options: AppendOptions) {
        for target in options.requested() {
            let Some(url) = target.destination(&self.config).active_url() else {
                tracing::debug!("{:?} notification requested but not configured", target);
                continue;
            };

            let notification = Notification::new(target, entry);
            if let Err(e) = self.notifier.send(url, &notification) {
                tracing::warn!("{:?} notification to {} failed: {}", target, url, e);
            }
        }
    }
}
