//! Terminal output for dockscope
//!
//! This crate renders classified log lines with severity based emphasis.

mod sink;
mod theme;

pub use sink::{ColorMode, TerminalSink};
pub use theme::Theme;

// Re-export types used in our public API
pub use dockscope_logs::RecordSink;
pub use dockscope_types::Severity;
