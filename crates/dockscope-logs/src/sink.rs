use std::io;

use dockscope_types::Severity;

/// Destination for formatted log lines.
///
/// Shared by every stream worker. Each call must be written as one unit so
/// lines from different sources never interleave mid-line.
pub trait RecordSink: Send + Sync + 'static {
    fn write(&self, severity: Severity, line: &str) -> io::Result<()>;
}

impl<T: RecordSink + ?Sized> RecordSink for std::sync::Arc<T> {
    fn write(&self, severity: Severity, line: &str) -> io::Result<()> {
        (**self).write(severity, line)
    }
}
