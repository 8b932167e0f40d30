// ABOUTME: Core library for daylog, containing the entry model and the pure helpers around it.
// ABOUTME: Severity classification, partition naming, the delimited row codec, config, and clocks.

pub mod clock;
pub mod config;
pub mod delimited;
pub mod entry;
pub mod partition;
pub mod severity;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, Destination, LogConfig};
pub use delimited::{Quoting, RowFormat};
pub use entry::{COLUMN_COUNT, LogEntry, UNKNOWN_LOCATION};
pub use severity::{Severity, classify};
