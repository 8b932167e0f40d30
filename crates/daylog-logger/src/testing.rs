// ABOUTME: Test utilities for daylog-logger: a recording notifier and a shared echo buffer.
// ABOUTME: Used in tests to observe notifications and terminal output without real I/O.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::notify::{Notification, Notifier, NotifyError};

/// A notifier that records every send and fails for chosen URLs.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, Notification)>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `url` fail after being recorded.
    pub fn fail_for(&self, url: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(url.to_owned());
    }

    /// All sends so far, as (url, notification) pairs in order.
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, url: &str, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((url.to_owned(), notification.clone()));

        let failing = self.failing.lock().unwrap_or_else(|p| p.into_inner());
        if failing.iter().any(|u| u == url) {
            return Err(NotifyError::Other(format!("simulated failure for {}", url)));
        }
        Ok(())
    }
}

/// An in-memory writer whose clones share one buffer, for capturing echo output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyTarget;
    use daylog_core::entry::LogEntry;
    use daylog_core::severity::Severity;

    #[test]
    fn recording_notifier_records_and_fails_on_demand() {
        let notifier = RecordingNotifier::new();
        notifier.fail_for("http://down");
        let entry = LogEntry {
            timestamp: "20240110090000".to_string(),
            severity: Severity::Message,
            process_name: "p".to_string(),
            code_location: "a.rs:1".to_string(),
            message: "hi".to_string(),
            elapsed_seconds: "0".to_string(),
        };
        let n = Notification::new(NotifyTarget::Url, &entry);

        assert!(notifier.send("http://up", &n).is_ok());
        assert!(notifier.send("http://down", &n).is_err());
        assert_eq!(notifier.sent().len(), 2);
    }

    #[test]
    fn shared_buffer_clones_see_same_bytes() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();
        writeln!(writer, "hello").unwrap();
        assert_eq!(buf.contents(), "hello\n");
    }
}
