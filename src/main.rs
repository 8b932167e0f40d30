// ABOUTME: Entry point for the daylog binary.
// ABOUTME: Initializes tracing, loads configuration, and appends each stdin line as a log entry.

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use daylog_core::config::LogConfig;
use daylog_logger::{AppendEngine, AppendOptions};

fn load_config() -> anyhow::Result<LogConfig> {
    match std::env::var("DAYLOG_CONFIG") {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            LogConfig::from_yaml_file(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        _ => LogConfig::from_env().context("invalid DAYLOG_* environment"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("daylog=info")),
        )
        .init();

    let config = load_config()?;
    tracing::info!(
        "daylog appending stdin to {} (prefix {})",
        config.log_path.display(),
        config.prefix
    );

    let mut engine = AppendEngine::new(config);
    let mut count = 0usize;
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        engine.append_at(&line, AppendOptions::default(), None);
        count += 1;
    }

    tracing::info!("appended {} entries", count);
    Ok(())
}
