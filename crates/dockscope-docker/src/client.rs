//! Docker Engine client for dockscope

use std::sync::Arc;

use bollard::container::{InspectContainerOptions, LogOutput, LogsOptions};
use bollard::errors::Error as BollardError;
use bollard::network::InspectNetworkOptions;
use futures::StreamExt;

use crate::error::SourceError;
use crate::lines::split_lines;
use crate::provider::{LineStream, SourceProvider};
use dockscope_types::{COMPOSE_SERVICE_LABEL, SourceInfo};

/// Docker client wrapper
#[derive(Clone)]
pub struct DockerClient {
    docker: Arc<bollard::Docker>,

    /// Lines of history to replay before following (`"all"` or a number)
    tail: String,
}

impl DockerClient {
    /// Connect using the platform's default socket or `DOCKER_HOST`
    pub fn connect_local() -> Result<Self, SourceError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| SourceError::Connection(format!("failed to connect to docker: {e}")))?;
        Ok(Self::from_docker(docker))
    }

    /// Connect to a specific Unix socket or named pipe
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, SourceError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    SourceError::Connection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self::from_docker(docker))
    }

    fn from_docker(docker: bollard::Docker) -> Self {
        Self {
            docker: Arc::new(docker),
            tail: "all".to_string(),
        }
    }

    /// Set how much history each stream replays before following
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<(), SourceError> {
        self.docker
            .ping()
            .await
            .map_err(|e| SourceError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }

    fn is_not_found(err: &BollardError) -> bool {
        matches!(
            err,
            BollardError::DockerResponseServerError {
                status_code: 404,
                ..
            }
        )
    }
}

impl SourceProvider for DockerClient {
    async fn list_sources(&self, network: &str) -> Result<Vec<SourceInfo>, SourceError> {
        let details = self
            .docker
            .inspect_network(network, None::<InspectNetworkOptions<String>>)
            .await
            .map_err(|e| {
                if Self::is_not_found(&e) {
                    SourceError::NetworkNotFound(network.to_string())
                } else {
                    SourceError::Discovery {
                        network: network.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let mut sources: Vec<SourceInfo> = details
            .containers
            .unwrap_or_default()
            .into_iter()
            .map(|(id, container)| {
                let name = container
                    .name
                    .map(|n| n.trim_start_matches('/').to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| id.clone());
                SourceInfo::new(id, name)
            })
            .collect();

        // The API hands back a map; keep start order stable between runs
        sources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!(network, count = sources.len(), "discovered containers");
        Ok(sources)
    }

    async fn service_label(&self, source_id: &str) -> Result<Option<String>, SourceError> {
        let details = self
            .docker
            .inspect_container(source_id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| SourceError::LabelLookup {
                source_id: source_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(details
            .config
            .and_then(|c| c.labels)
            .and_then(|mut labels| labels.remove(COMPOSE_SERVICE_LABEL)))
    }

    async fn open_lines(&self, source_id: &str) -> Result<LineStream, SourceError> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            tail: self.tail.clone(),
            ..Default::default()
        };

        // The request is only sent once the stream is polled, so a container
        // that cannot be reached shows up as the first item.
        let id = source_id.to_string();
        let mut opened = false;
        let chunks = self
            .docker
            .logs(source_id, Some(options))
            .map(move |item| {
                let first = !std::mem::replace(&mut opened, true);
                match item {
                    Ok(output) => Ok(output_bytes(output)),
                    Err(e) if first => Err(SourceError::TransportOpen {
                        source_id: id.clone(),
                        reason: e.to_string(),
                    }),
                    Err(e) => Err(SourceError::TransportRead {
                        source_id: id.clone(),
                        reason: e.to_string(),
                    }),
                }
            });

        Ok(split_lines(chunks))
    }
}

fn output_bytes(output: LogOutput) -> Vec<u8> {
    match output {
        LogOutput::StdOut { message }
        | LogOutput::StdErr { message }
        | LogOutput::StdIn { message }
        | LogOutput::Console { message } => message.to_vec(),
    }
}
