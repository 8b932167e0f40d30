// ABOUTME: Persistence layer for daylog, handling partition files and the optional SQLite mirror.
// ABOUTME: Provides append-with-header partition files, structured tables, and the query engine.

pub mod partition_file;
pub mod query;
pub mod sqlite;
pub mod table;

pub use partition_file::{AppendOutcome, PartitionError, PartitionFile};
pub use query::{QueryEngine, QueryError};
pub use sqlite::{SqliteError, SqliteMirror};
pub use table::LogTable;
