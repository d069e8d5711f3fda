//! Container engine contract
//!
//! The dashboard only ever reads snapshots from the engine and asks it to
//! change container state. `ContainerEngine` is that surface; `docker.rs`
//! backs it with the Docker Engine API and the web tests back it with a fake.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine calls.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached at all.
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The engine answered with an error status.
    #[error("engine error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("engine call timed out after {0:?}")]
    Timeout(Duration),
}

/// One container as reported by the engine at listing time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineRecord {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    /// Lifecycle state as the engine spells it (`running`, `exited`, ...).
    pub state: String,
    pub status: String,
    pub labels: BTreeMap<String, String>,
    pub ports: Vec<EnginePort>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnginePort {
    pub ip: Option<String>,
    pub private_port: u16,
    pub public_port: Option<u16>,
    pub protocol: String,
}

/// Host-level facts from the engine's info endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub server_version: String,
    pub name: String,
    pub ncpu: i64,
    pub mem_total: i64,
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn list(&self, include_stopped: bool) -> Result<Vec<EngineRecord>>;

    async fn info(&self) -> Result<EngineSnapshot>;

    async fn start(&self, id: &str) -> Result<()>;

    async fn stop(&self, id: &str) -> Result<()>;

    async fn pause(&self, id: &str) -> Result<()>;

    async fn unpause(&self, id: &str) -> Result<()>;
}

/// Run an engine call, giving up after `deadline` when one is set.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(EngineError::Timeout(limit))),
        None => call.await,
    }
}
