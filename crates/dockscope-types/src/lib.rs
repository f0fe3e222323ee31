//! Shared types for dockscope
//!
//! This crate contains data structures used across multiple dockscope crates.

use chrono::{DateTime, Utc};
use std::ops::AddAssign;

/// Format used when stamping records: `YYYY-MM-DD HH:MM:SS` in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Docker Compose label carrying the service name of a container.
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

// ============================================================================
// Source Types
// ============================================================================

/// A container as reported by discovery: just its id and raw name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
}

impl SourceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A monitored source with its resolved display label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub name: String,

    /// Compose service label, preferred over the raw name for display
    pub label: Option<String>,
}

impl Source {
    pub fn new(info: SourceInfo, label: Option<String>) -> Self {
        Self {
            id: info.id,
            name: info.name,
            label: label.filter(|l| !l.trim().is_empty()),
        }
    }

    /// Name shown next to every emitted line
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Severity assigned to a line by the classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
    /// Matched none of the severity rules
    None,
}

impl Severity {
    /// Parse a level name as accepted on the command line
    pub fn from_level_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// A single classified log line
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Container id the line came from
    pub source_id: String,

    /// Display name of the source (compose service or container name)
    pub source_name: String,

    /// When the line was read
    pub timestamp: DateTime<Utc>,

    /// Line as received from the transport
    pub raw: String,

    /// Line after sanitizing; never empty
    pub text: String,

    pub severity: Severity,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(source: &Source, raw: String, text: String, severity: Severity) -> Self {
        Self {
            source_id: source.id.clone(),
            source_name: source.display_name().to_string(),
            timestamp: Utc::now(),
            raw,
            text,
            severity,
        }
    }

    /// Render as `[timestamp] [source] text`
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_name,
            self.text
        )
    }
}

/// Count of lines per severity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub error: u64,
    pub warning: u64,
    pub info: u64,
    pub debug: u64,
    pub none: u64,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
            Severity::Debug => self.debug += 1,
            Severity::None => self.none += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
            Severity::Debug => self.debug,
            Severity::None => self.none,
        }
    }

    pub fn total(&self) -> u64 {
        self.error + self.warning + self.info + self.debug + self.none
    }
}

impl AddAssign for SeverityCounts {
    fn add_assign(&mut self, other: Self) {
        self.error += other.error;
        self.warning += other.warning;
        self.info += other.info;
        self.debug += other.debug;
        self.none += other.none;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_name_prefers_label() {
        let info = SourceInfo::new("abc123", "myproj-api-1");
        let source = Source::new(info.clone(), Some("api".to_string()));
        assert_eq!(source.display_name(), "api");

        let source = Source::new(info.clone(), None);
        assert_eq!(source.display_name(), "myproj-api-1");

        // Blank labels are ignored
        let source = Source::new(info, Some("  ".to_string()));
        assert_eq!(source.display_name(), "myproj-api-1");
    }

    #[test]
    fn test_level_names() {
        assert_eq!(Severity::from_level_name("error"), Some(Severity::Error));
        assert_eq!(Severity::from_level_name(" WARN "), Some(Severity::Warning));
        assert_eq!(Severity::from_level_name("warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_level_name("info"), Some(Severity::Info));
        assert_eq!(Severity::from_level_name("debug"), Some(Severity::Debug));
        assert_eq!(Severity::from_level_name("trace"), None);
    }

    #[test]
    fn test_format_line() {
        let source = Source::new(SourceInfo::new("abc", "db-1"), Some("db".to_string()));
        let mut record = LogRecord::new(
            &source,
            "ERROR: disk full\r".to_string(),
            "ERROR: disk full".to_string(),
            Severity::Error,
        );
        record.timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(record.format_line(), "[2024-01-15 10:30:05] [db] ERROR: disk full");
    }

    #[test]
    fn test_counts() {
        let mut counts = SeverityCounts::default();
        counts.record(Severity::Error);
        counts.record(Severity::Error);
        counts.record(Severity::None);

        let mut other = SeverityCounts::default();
        other.record(Severity::Info);
        counts += other;

        assert_eq!(counts.get(Severity::Error), 2);
        assert_eq!(counts.get(Severity::Info), 1);
        assert_eq!(counts.total(), 4);
    }
}
