//! Errors raised while talking to log sources.

/// Failure of discovery, label lookup or a single source's log stream
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The Docker daemon could not be reached at all
    #[error("docker connection error: {0}")]
    Connection(String),

    /// The requested network does not exist
    #[error("network '{0}' not found")]
    NetworkNotFound(String),

    /// Listing the network's containers failed for another reason
    #[error("failed to inspect network '{network}': {reason}")]
    Discovery { network: String, reason: String },

    /// Reading a container's labels failed
    #[error("label lookup failed for container {source_id}: {reason}")]
    LabelLookup { source_id: String, reason: String },

    /// The log stream of a container could not be opened
    #[error("failed to open log stream for container {source_id}: {reason}")]
    TransportOpen { source_id: String, reason: String },

    /// The log stream broke after it was opened
    #[error("log stream for container {source_id} failed: {reason}")]
    TransportRead { source_id: String, reason: String },
}
