use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::filter::{FilterConfig, should_emit};
use crate::sink::RecordSink;
use crate::{classify, sanitize};
use dockscope_docker::{SourceError, SourceProvider};
use dockscope_types::{LogRecord, SeverityCounts, Source, SourceInfo};

/// Why a single source's worker stopped with an error
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("writing output failed: {0}")]
    Sink(#[from] std::io::Error),

    #[error("no output from '{source_name}' for {after:?}")]
    Idle {
        source_name: String,
        after: Duration,
    },

    #[error("stream worker aborted: {0}")]
    Aborted(String),
}

/// How a worker ended without error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// The source closed its log stream
    Closed,
    /// The run was cancelled
    Cancelled,
}

/// Outcome of one source's worker
#[derive(Debug)]
pub struct WorkerReport {
    pub source: Source,

    /// Lines received from the transport, including dropped ones
    pub lines_read: u64,

    /// Lines handed to the sink, per severity
    pub emitted: SeverityCounts,

    pub exit: Result<WorkerExit, StreamError>,
}

impl WorkerReport {
    fn new(source: Source) -> Self {
        Self {
            source,
            lines_read: 0,
            emitted: SeverityCounts::default(),
            exit: Ok(WorkerExit::Closed),
        }
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunReport {
    pub workers: Vec<WorkerReport>,

    /// Sources left out by the source name filters
    pub skipped: Vec<SourceInfo>,
}

impl RunReport {
    /// Workers that stopped because of an error
    pub fn failures(&self) -> impl Iterator<Item = (&Source, &StreamError)> {
        self.workers
            .iter()
            .filter_map(|w| w.exit.as_ref().err().map(|e| (&w.source, e)))
    }

    /// Total emitted lines per severity across all sources
    pub fn emitted(&self) -> SeverityCounts {
        let mut total = SeverityCounts::default();
        for worker in &self.workers {
            total += worker.emitted;
        }
        total
    }

    pub fn lines_read(&self) -> u64 {
        self.workers.iter().map(|w| w.lines_read).sum()
    }
}

/// Follows every source in its own task and funnels the surviving lines
/// into one sink
pub struct StreamAggregator<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    filter: Arc<FilterConfig>,

    /// Cancellation token for stopping workers
    cancel: CancellationToken,

    /// Give up on a source that stays silent this long
    idle_timeout: Option<Duration>,
}

impl<P: SourceProvider, S: RecordSink> StreamAggregator<P, S> {
    pub fn new(provider: Arc<P>, sink: S, filter: FilterConfig) -> Self {
        Self {
            provider,
            sink: Arc::new(sink),
            filter: Arc::new(filter),
            cancel: CancellationToken::new(),
            idle_timeout: None,
        }
    }

    /// Stop when `parent` is cancelled
    pub fn with_cancel(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Follow all admitted sources until each stream ends or the run is
    /// cancelled.
    ///
    /// A failing source only ends its own worker.
    pub async fn run(&self, sources: Vec<SourceInfo>) -> RunReport {
        let mut report = RunReport::default();
        let mut tasks = Vec::new();
        let offered = sources.len();

        for info in sources {
            if !self.filter.admits_source(&info.name) {
                tracing::debug!(source = %info.name, "skipped by service filter");
                report.skipped.push(info);
                continue;
            }

            let task = self.spawn_worker(info.clone());
            tasks.push((info, task));
        }

        if tasks.is_empty() && offered > 0 {
            tracing::warn!("no containers matched the service filters");
        }

        for (info, task) in tasks {
            match task.await {
                Ok(worker) => report.workers.push(worker),
                Err(e) => {
                    tracing::error!(source = %info.name, error = %e, "stream worker aborted");
                    let mut worker = WorkerReport::new(Source::new(info, None));
                    worker.exit = Err(StreamError::Aborted(e.to_string()));
                    report.workers.push(worker);
                }
            }
        }

        report
    }

    fn spawn_worker(&self, info: SourceInfo) -> tokio::task::JoinHandle<WorkerReport> {
        let worker = Worker {
            provider: Arc::clone(&self.provider),
            sink: Arc::clone(&self.sink),
            filter: Arc::clone(&self.filter),
            cancel: self.cancel.clone(),
            idle_timeout: self.idle_timeout,
            info,
        };

        tokio::spawn(worker.run())
    }
}

impl<P, S> Drop for StreamAggregator<P, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    filter: Arc<FilterConfig>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
    info: SourceInfo,
}

impl<P: SourceProvider, S: RecordSink> Worker<P, S> {
    async fn run(self) -> WorkerReport {
        let mut report = WorkerReport::new(Source::new(self.info.clone(), None));

        let exit = tokio::select! {
            _ = self.cancel.cancelled() => Ok(WorkerExit::Cancelled),
            result = self.follow(&mut report) => result,
        };

        let name = report.source.display_name().to_string();
        match &exit {
            Ok(WorkerExit::Closed) => tracing::info!(source = %name, "log stream closed"),
            Ok(WorkerExit::Cancelled) => tracing::debug!(source = %name, "log stream cancelled"),
            Err(e) => tracing::error!(source = %name, error = %e, "stopped following logs"),
        }

        report.exit = exit;
        report
    }

    async fn follow(&self, report: &mut WorkerReport) -> Result<WorkerExit, StreamError> {
        let label = match self.provider.service_label(&self.info.id).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(source = %self.info.name, error = %e, "using container name");
                None
            }
        };
        report.source = Source::new(self.info.clone(), label);
        let source = report.source.clone();

        // A running container that has not logged yet can hold the open
        let mut lines = self
            .within_idle_limit(&source, self.provider.open_lines(&source.id))
            .await??;
        tracing::info!(source = %source.display_name(), source_id = %source.id, "following logs");

        loop {
            let next = self.within_idle_limit(&source, lines.next()).await?;

            let Some(item) = next else {
                return Ok(WorkerExit::Closed);
            };
            let raw = item?;
            report.lines_read += 1;

            if let Some(record) = process_line(&source, raw, &self.filter) {
                self.sink.write(record.severity, &record.format_line())?;
                report.emitted.record(record.severity);
            }
        }
    }

    async fn within_idle_limit<F: Future>(
        &self,
        source: &Source,
        fut: F,
    ) -> Result<F::Output, StreamError> {
        let Some(limit) = self.idle_timeout else {
            return Ok(fut.await);
        };

        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| StreamError::Idle {
                source_name: source.display_name().to_string(),
                after: limit,
            })
    }
}

/// Sanitize, classify and filter one raw line
fn process_line(source: &Source, raw: String, filter: &FilterConfig) -> Option<LogRecord> {
    let text = sanitize(&raw);
    if text.is_empty() {
        return None;
    }

    let severity = classify(&text.to_lowercase());
    let record = LogRecord::new(source, raw, text, severity);
    should_emit(&record, filter).then_some(record)
}
