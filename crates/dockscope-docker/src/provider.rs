use std::future::Future;

use futures::stream::BoxStream;

use crate::error::SourceError;
use dockscope_types::SourceInfo;

/// Lazily produced, non-restartable sequence of log lines from one source.
///
/// The stream ends when the source stops; an `Err` item means the stream
/// broke and no further items follow.
pub type LineStream = BoxStream<'static, Result<String, SourceError>>;

/// Everything the log engine needs from the container runtime.
///
/// [`DockerClient`](crate::DockerClient) is the production implementation;
/// tests provide scripted ones.
pub trait SourceProvider: Send + Sync + 'static {
    /// List the containers attached to a network.
    ///
    /// An unknown network is `SourceError::NetworkNotFound`. A network with
    /// no containers yields an empty list.
    fn list_sources(
        &self,
        network: &str,
    ) -> impl Future<Output = Result<Vec<SourceInfo>, SourceError>> + Send;

    /// Compose service name of a container, if it carries one.
    fn service_label(
        &self,
        source_id: &str,
    ) -> impl Future<Output = Result<Option<String>, SourceError>> + Send;

    /// Open a follow-mode line stream for a container.
    fn open_lines(
        &self,
        source_id: &str,
    ) -> impl Future<Output = Result<LineStream, SourceError>> + Send;
}
