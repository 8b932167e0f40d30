// ABOUTME: Write side of daylog: the append engine and outbound notifications.
// ABOUTME: Re-exports the engine, its options, and the notifier seam used by callers and tests.

pub mod engine;
pub mod notify;
pub mod testing;

pub use engine::{AppendEngine, AppendOptions};
pub use notify::{HttpNotifier, Notification, Notifier, NotifyError, NotifyTarget};
