//! Docker Engine API backend for `ContainerEngine`

use std::net::IpAddr;

use async_trait::async_trait;
use bollard::errors::Error as DockerError;
use bollard::models::{ContainerSummary, SystemInfo};
use bollard::query_parameters::{
    ListContainersOptionsBuilder, StartContainerOptions, StopContainerOptions,
};
use bollard::Docker;
use tracing::debug;

use crate::engine::{
    ContainerEngine, EngineError, EnginePort, EngineRecord, EngineSnapshot, Result,
};

/// Engine handle shared by every request; bollard's client is cheap to clone
/// and safe to use from concurrent tasks.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using `DOCKER_HOST` (and related variables) or the local socket.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_defaults()?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list(&self, include_stopped: bool) -> Result<Vec<EngineRecord>> {
        let options = ListContainersOptionsBuilder::new().all(include_stopped).build();
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.into_iter().map(record_from_summary).collect())
    }

    async fn info(&self) -> Result<EngineSnapshot> {
        let info = self.docker.info().await?;
        Ok(snapshot_from_info(info))
    }

    async fn start(&self, id: &str) -> Result<()> {
        debug!(container = %id, "start");
        already_there(self.docker.start_container(id, None::<StartContainerOptions>).await)
    }

    async fn stop(&self, id: &str) -> Result<()> {
        debug!(container = %id, "stop");
        already_there(self.docker.stop_container(id, None::<StopContainerOptions>).await)
    }

    async fn pause(&self, id: &str) -> Result<()> {
        debug!(container = %id, "pause");
        already_there(self.docker.pause_container(id).await)
    }

    async fn unpause(&self, id: &str) -> Result<()> {
        debug!(container = %id, "unpause");
        already_there(self.docker.unpause_container(id).await)
    }
}

/// The engine answers 304 when the container is already in the requested state.
fn already_there(result: std::result::Result<(), DockerError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(DockerError::DockerResponseServerError {
            status_code: 304, ..
        }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl From<DockerError> for EngineError {
    fn from(err: DockerError) -> Self {
        match err {
            DockerError::DockerResponseServerError {
                status_code: 404,
                message,
            } => EngineError::NotFound(message),
            DockerError::DockerResponseServerError {
                status_code: 409,
                message,
            } => EngineError::Conflict(message),
            DockerError::DockerResponseServerError {
                status_code,
                message,
            } => EngineError::Api {
                status: status_code,
                message,
            },
            other => EngineError::Connection(other.to_string()),
        }
    }
}

fn record_from_summary(c: ContainerSummary) -> EngineRecord {
    EngineRecord {
        id: c.id.unwrap_or_default(),
        names: c.names.unwrap_or_default(),
        image: c.image.unwrap_or_default(),
        state: c.state.map(|s| s.to_string()).unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        labels: c.labels.unwrap_or_default().into_iter().collect(),
        ports: c
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|p| EnginePort {
                ip: p.ip.as_deref().and_then(canonical_ip),
                private_port: p.private_port,
                public_port: p.public_port,
                protocol: p.typ.map(|t| t.to_string()).unwrap_or_default(),
            })
            .collect(),
    }
}

/// Normalise an address the way the engine would print it (`::` rather than
/// `0:0:0:0:0:0:0:0`); anything unparsable is passed through verbatim.
fn canonical_ip(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

fn snapshot_from_info(info: SystemInfo) -> EngineSnapshot {
    EngineSnapshot {
        server_version: info.server_version.unwrap_or_default(),
        name: info.name.unwrap_or_default(),
        ncpu: info.ncpu.unwrap_or_default(),
        mem_total: info.mem_total.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16, message: &str) -> DockerError {
        DockerError::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            EngineError::from(server_error(404, "No such container: x")),
            EngineError::NotFound(m) if m == "No such container: x"
        ));
        assert!(matches!(
            EngineError::from(server_error(409, "is already paused")),
            EngineError::Conflict(_)
        ));
        assert!(matches!(
            EngineError::from(server_error(500, "boom")),
            EngineError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_not_modified_is_success() {
        assert!(already_there(Err(server_error(304, ""))).is_ok());
        assert!(already_there(Ok(())).is_ok());
        assert!(matches!(
            already_there(Err(server_error(404, "gone"))),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_canonical_ip() {
        assert_eq!(canonical_ip("0.0.0.0").as_deref(), Some("0.0.0.0"));
        assert_eq!(canonical_ip("0:0:0:0:0:0:0:0").as_deref(), Some("::"));
        assert_eq!(canonical_ip("").as_deref(), None);
        assert_eq!(canonical_ip("not-an-ip").as_deref(), Some("not-an-ip"));
    }

    #[test]
    fn test_snapshot_defaults_missing_fields() {
        let info = SystemInfo {
            server_version: Some("27.3.1".into()),
            ncpu: Some(8),
            ..Default::default()
        };
        let snap = snapshot_from_info(info);
        assert_eq!(snap.server_version, "27.3.1");
        assert_eq!(snap.name, "");
        assert_eq!(snap.ncpu, 8);
        assert_eq!(snap.mem_total, 0);
    }

    #[test]
    fn test_record_from_empty_summary() {
        let record = record_from_summary(ContainerSummary::default());
        assert_eq!(record, EngineRecord::default());
    }
}
