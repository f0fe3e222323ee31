//! Log processing for dockscope
//!
//! This crate provides line sanitizing, severity classification, filtering,
//! and the per-container streaming that ties them together.

mod classify;
mod filter;
mod sanitize;
mod sink;
mod stream;

pub use classify::{classify, is_debug, is_error, is_info, is_warning};
pub use filter::{FilterConfig, LevelFlags, LevelSelection, matches_source_name, should_emit};
pub use sanitize::sanitize;
pub use sink::RecordSink;
pub use stream::{RunReport, StreamAggregator, StreamError, WorkerExit, WorkerReport};

// Re-export types used in our public API
pub use dockscope_types::{LogRecord, Severity, SeverityCounts, Source, SourceInfo};
