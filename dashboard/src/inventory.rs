//! Inventory projection: engine records into the dashboard's display model
//!
//! Everything here is pure: one listing plus one info snapshot in, one
//! `PageData` out. Containers are bucketed by their state string with a
//! catch-all, so states the engine adds later land in Stopped.

use std::collections::BTreeMap;

use crate::engine::{EnginePort, EngineRecord, EngineSnapshot};

const SHORT_ID_LEN: usize = 10;
const DIGEST_PREFIX: &str = "sha256:";
const DIGEST_SHORT_LEN: usize = 12;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortSummary {
    /// Bind address, empty when the engine reports none.
    pub ip: String,
    pub private_port: u16,
    /// 0 when the port is not published.
    pub public_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub version: String,
    pub state: String,
    pub status: String,
    pub labels: BTreeMap<String, String>,
    pub ports: Vec<PortSummary>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineInfo {
    pub version: String,
    pub node_name: String,
    pub cpus: i64,
    pub mem_total: String,
}

/// Everything the page template needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    pub running: Vec<DisplayContainer>,
    pub paused: Vec<DisplayContainer>,
    pub stopped: Vec<DisplayContainer>,
    pub count_running: usize,
    pub count_paused: usize,
    pub count_stopped: usize,
    pub engine: EngineInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Running,
    Paused,
    Stopped,
}

impl Bucket {
    pub fn for_state(state: &str) -> Self {
        match state {
            "running" => Bucket::Running,
            "paused" => Bucket::Paused,
            _ => Bucket::Stopped,
        }
    }
}

impl PageData {
    /// Project and bucket a listing, preserving engine order within each bucket.
    pub fn from_records(records: Vec<EngineRecord>) -> Self {
        let mut page = PageData::default();
        for record in records {
            let container = project(record);
            match Bucket::for_state(&container.state) {
                Bucket::Running => page.running.push(container),
                Bucket::Paused => page.paused.push(container),
                Bucket::Stopped => page.stopped.push(container),
            }
        }
        page.count_running = page.running.len();
        page.count_paused = page.paused.len();
        page.count_stopped = page.stopped.len();
        page
    }

    pub fn with_engine(mut self, engine: EngineInfo) -> Self {
        self.engine = engine;
        self
    }
}

impl From<EngineSnapshot> for EngineInfo {
    fn from(snapshot: EngineSnapshot) -> Self {
        Self {
            version: snapshot.server_version,
            node_name: snapshot.name,
            cpus: snapshot.ncpu,
            mem_total: format_memory(snapshot.mem_total),
        }
    }
}

pub fn project(record: EngineRecord) -> DisplayContainer {
    let id = short_id(&record.id).to_string();
    // Engines always report at least one name; fall back to the id if not.
    let name = record
        .names
        .first()
        .map(|n| display_name(n).to_string())
        .unwrap_or_else(|| id.clone());

    DisplayContainer {
        version: extract_version(&record.image).to_string(),
        id,
        name,
        image: record.image,
        state: record.state,
        status: record.status,
        labels: record.labels,
        ports: record.ports.into_iter().map(PortSummary::from).collect(),
    }
}

impl From<EnginePort> for PortSummary {
    fn from(port: EnginePort) -> Self {
        Self {
            ip: port.ip.unwrap_or_default(),
            private_port: port.private_port,
            public_port: port.public_port.unwrap_or_default(),
            protocol: port.protocol,
        }
    }
}

/// First ten characters of the engine id, or the whole id when shorter.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Engine names carry a leading `/`; strip exactly one.
pub fn display_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Version tag shown next to the image.
///
/// `sha256:` references yield the first 12 digest characters, tagged
/// references the text after the last `:`, and untagged ones `latest`.
pub fn extract_version(image: &str) -> &str {
    if let Some(digest) = image.strip_prefix(DIGEST_PREFIX) {
        return digest.get(..DIGEST_SHORT_LEN).unwrap_or(digest);
    }
    match image.rfind(':') {
        Some(i) => &image[i + 1..],
        None => "latest",
    }
}

/// Bytes as GiB with one decimal, e.g. `8.0GB`.
pub fn format_memory(bytes: i64) -> String {
    format!("{:.1}GB", bytes as f64 / GIB)
}
