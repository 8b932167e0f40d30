// ABOUTME: End-to-end smoke test for the full daylog lifecycle.
// ABOUTME: Appends across several days, then pages, slices, and range-scans the stored partitions.

use std::sync::Arc;

use chrono::NaiveDateTime;
use daylog_core::clock::ManualClock;
use daylog_core::config::LogConfig;
use daylog_core::severity::Severity;
use daylog_logger::testing::RecordingNotifier;
use daylog_logger::{AppendEngine, AppendOptions};
use daylog_store::{QueryError, QueryEngine, SqliteMirror};

fn at(ts: &str) -> NaiveDateTime {
    daylog_core::partition::parse_timestamp(ts).unwrap()
}

fn config(dir: &std::path::Path) -> LogConfig {
    LogConfig {
        log_path: dir.join("logs"),
        prefix: "smoke".to_string(),
        page_size: 4,
        database_storage: true,
        ..LogConfig::default()
    }
}

#[test]
fn smoke_test_full_lifecycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());

    // 1. Ten entries on Jan 10, one second apart, with awkward messages mixed in.
    let clock = ManualClock::new(at("20240110090000"));
    let notifier = RecordingNotifier::new();
    let mut engine = AppendEngine::new(config.clone())
        .with_clock(Arc::new(clock.clone()))
        .with_notifier(Box::new(notifier.clone()))
        .with_process_name("smoke");

    for i in 1..=10 {
        let message = match i {
            3 => "Payment failed: timeout".to_string(),
            5 => "Disk usage warning | 91%\nsecond line".to_string(),
            _ => format!("User {} logged in", i),
        };
        engine.append_with(&message, AppendOptions::new().slack());
        clock.advance_millis(1000);
    }

    // 2. Nothing on Jan 11; three entries late on Jan 12.
    clock.set(at("20240112230000"));
    for i in 1..=3 {
        engine.append(&format!("late entry {}", i));
        clock.advance_millis(1000);
    }

    // Slack was requested but never configured, so nothing was sent.
    assert!(notifier.sent().is_empty());

    // 3. Read back Jan 10 in full.
    let query = QueryEngine::with_clock(config.clone(), Arc::new(clock.clone()));
    let day = query.read_partition("20240110").unwrap();
    assert_eq!(day.len(), 10);
    assert_eq!(day.columns, config.columns);
    let entries = day.entries();
    assert_eq!(entries[2].severity, Severity::Error);
    assert_eq!(entries[4].severity, Severity::Warning);
    assert_eq!(entries[4].message, "Disk usage warning | 91%\nsecond line");
    assert_eq!(entries[0].elapsed_seconds, "0");
    assert_eq!(entries[1].elapsed_seconds, "1.0");
    assert!(entries.iter().all(|e| e.code_location.starts_with("smoke.rs:")));

    // 4. Line range scenario: positions 3..=7.
    let range = query.get_range("20240110", 3, 7).unwrap();
    let stamps: Vec<&str> = range.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        stamps,
        vec!["20240110090002", "20240110090003", "20240110090004", "20240110090005", "20240110090006"]
    );

    // 5. Paging is over today's partition (Jan 12, three rows, page size 4).
    assert_eq!(query.total_pages(None).unwrap(), 1);
    assert_eq!(query.get_page(1).unwrap().len(), 3);
    assert!(matches!(query.get_page(2), Err(QueryError::InvalidArgument(_))));
    assert_eq!(query.total_pages(Some("20240110")).unwrap(), 3);
    assert_eq!(query.total_pages(Some("20240111")).unwrap(), 0);
    assert_eq!(query.total_pages(Some("19990101")).unwrap(), 0);

    // 6. Range scan across the gap day.
    let between = query.get_between("20240110090008", "20240112230001").unwrap();
    let stamps: Vec<&str> = between.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        stamps,
        vec!["20240110090008", "20240110090009", "20240112230000", "20240112230001"]
    );

    // 7. The SQLite mirror saw every append.
    let mirrored = SqliteMirror::new(config.database_path(), config.columns.clone())
        .read_all()
        .unwrap();
    assert_eq!(mirrored.len(), 13);

    // 8. Results serialize for dashboards.
    let json = serde_json::to_value(&between).unwrap();
    assert_eq!(json["rows"].as_array().unwrap().len(), 4);
    assert_eq!(json["columns"][0], "timestamp");
}

#[test]
fn smoke_test_missing_today_reports_no_logs() {
    let dir = tempfile::TempDir::new().unwrap();
    let clock = ManualClock::new(at("20240110090000"));
    let query = QueryEngine::with_clock(config(dir.path()), Arc::new(clock));

    assert!(matches!(query.total_pages(None), Err(QueryError::NoLogs(_))));
    assert!(matches!(query.get_page(1), Err(QueryError::NotFound(_))));
    assert!(query.get_between("20240101000000", "20240110235959").unwrap().is_empty());
}
