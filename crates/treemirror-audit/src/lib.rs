//! treemirror audit - Action log sinks
//!
//! Provides:
//! - `ActionLogger`: Writes one `"<Label>: <path>"` line per action to stdout
//!   and appends it to a log file
//! - `MemorySyncLog`: Collects events in memory for tests and dry runs
//!
//! Both implement `ISyncLog` from `treemirror-core`.

pub mod logger;
pub mod memory;

pub use logger::ActionLogger;
pub use memory::MemorySyncLog;
