//! Wire types for the instance API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /v1/instances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCreate {
    pub name: String,
    pub description: String,
    pub hostname: String,
    /// Memory in bytes.
    pub memory: u64,
    pub ncpus: u16,
    /// Boot the instance as part of creation.
    pub start: bool,
    pub network_interfaces: InstanceNetworkInterfaceAttachment,
    #[serde(default)]
    pub disks: Vec<InstanceDiskAttachment>,
    #[serde(default)]
    pub external_ips: Vec<ExternalIpCreate>,
    /// Base64-encoded cloud-init payload, empty when unset.
    #[serde(default)]
    pub user_data: String,
}

/// How network interfaces are provisioned at create time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceNetworkInterfaceAttachment {
    /// No interfaces; they are managed as separate resources.
    None,
    /// A single interface on the project's default subnet.
    Default,
}

/// A disk to attach while creating an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceDiskAttachment {
    /// Attach an existing disk by name.
    Attach { name: String },
}

/// An external IP to allocate while creating an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalIpCreate {
    /// Ephemeral address drawn from the named pool.
    Ephemeral { pool_name: String },
}

/// Body of `POST /v1/instances/{instance}/disks/detach`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskPath {
    pub disk: String,
}

// =============================================================================
// Responses
// =============================================================================

/// Run state reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Creating,
    Starting,
    Running,
    Stopping,
    Stopped,
    Rebooting,
    Migrating,
    Repairing,
    Failed,
    Destroyed,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Creating => "creating",
            InstanceState::Starting => "starting",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Rebooting => "rebooting",
            InstanceState::Migrating => "migrating",
            InstanceState::Repairing => "repairing",
            InstanceState::Failed => "failed",
            InstanceState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instance as returned by view, create and stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub description: String,
    pub hostname: String,
    pub memory: u64,
    pub ncpus: u16,
    pub project_id: String,
    pub run_state: InstanceState,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub time_run_state_updated: DateTime<Utc>,
}

/// Attachment state of a disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiskState {
    Creating,
    Detached,
    Attaching { instance: String },
    Attached { instance: String },
    Detaching { instance: String },
    Destroyed,
    Faulted,
    #[serde(other)]
    Other,
}

/// A disk, as listed under an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    pub state: Option<DiskState>,
}

/// One page of `GET /v1/instances/{instance}/disks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskResultsPage {
    pub items: Vec<Disk>,
    pub next_page: Option<String>,
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    pub message: String,
}
