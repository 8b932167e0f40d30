// ABOUTME: Outbound notification of log entries to chat or webhook destinations.
// ABOUTME: Defines the Notifier trait, the payload shape, and a blocking HTTP POST transport.

use std::time::Duration;

use daylog_core::config::{Destination, LogConfig};
use daylog_core::entry::LogEntry;
use serde::Serialize;
use thiserror::Error;

/// Timeout applied to every outbound request.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("destination responded with status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// A configured notification destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyTarget {
    Telegram,
    Slack,
    Url,
}

impl NotifyTarget {
    pub const ALL: [NotifyTarget; 3] = [NotifyTarget::Telegram, NotifyTarget::Slack, NotifyTarget::Url];

    /// The destination settings for this target.
    pub fn destination<'a>(&self, config: &'a LogConfig) -> &'a Destination {
        match self {
            NotifyTarget::Telegram => &config.telegram,
            NotifyTarget::Slack => &config.slack,
            NotifyTarget::Url => &config.url,
        }
    }
}

/// Body sent to a destination: the message text plus the full entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub target: NotifyTarget,
    pub message: String,
    pub entry: LogEntry,
}

impl Notification {
    pub fn new(target: NotifyTarget, entry: &LogEntry) -> Self {
        Self {
            target,
            message: entry.message.clone(),
            entry: entry.clone(),
        }
    }
}

/// Transport for notifications. Implementations must not panic on failure.
pub trait Notifier: Send + Sync {
    fn send(&self, url: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// POSTs the notification as JSON. Builds a client per request, so no
/// connection outlives a single send.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    timeout: Duration,
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new(NOTIFY_TIMEOUT)
    }
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Notifier for HttpNotifier {
    fn send(&self, url: &str, notification: &Notification) -> Result<(), NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let resp = client.post(url).json(notification).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}
