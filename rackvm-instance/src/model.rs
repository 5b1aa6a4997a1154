//! Declared and observed instance records.

use chrono::{DateTime, Utc};
use rackvm_client::{Instance, InstanceState};
use serde::{Deserialize, Serialize};

use crate::timeouts::TimeoutsConfig;

/// Desired attributes of an instance, as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub host_name: String,
    /// Memory in bytes.
    pub memory: i64,
    pub ncpus: i64,
    /// Boot after provisioning. Unset means `true`.
    pub start_on_create: Option<bool>,
    /// Quoted disk-name tokens, e.g. `"\"boot\""`.
    pub attach_to_disks: Vec<String>,
    /// Quoted IP-pool-name tokens.
    pub external_ips: Vec<String>,
    /// Base64 cloud-init payload.
    pub user_data: Option<String>,
    pub timeouts: TimeoutsConfig,
}

impl ResourceSpec {
    pub fn start_on_create(&self) -> bool {
        self.start_on_create.unwrap_or(true)
    }
}

/// Observed attributes of an instance that exists on the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub host_name: String,
    pub memory: i64,
    pub ncpus: i64,
    pub start_on_create: bool,
    #[serde(default)]
    pub attach_to_disks: Vec<String>,
    #[serde(default)]
    pub external_ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub run_state: InstanceState,
}

impl ResourceState {
    /// State right after a successful create.
    ///
    /// Declared attributes are echoed from `spec`; identity, timestamps and
    /// run state come from the control plane.
    pub fn created(spec: &ResourceSpec, instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            project_id: spec.project_id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            host_name: spec.host_name.clone(),
            memory: spec.memory,
            ncpus: spec.ncpus,
            start_on_create: spec.start_on_create(),
            attach_to_disks: spec.attach_to_disks.clone(),
            external_ips: spec.external_ips.clone(),
            user_data: spec.user_data.clone(),
            timeouts: spec.timeouts.clone(),
            time_created: instance.time_created,
            time_modified: instance.time_modified,
            run_state: instance.run_state,
        }
    }

    /// Refresh observed attributes from `instance`.
    ///
    /// Attributes the control plane does not report (start flag, disk and IP
    /// lists, user data, timeouts) are carried over unchanged.
    pub fn refreshed(&self, instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            project_id: instance.project_id.clone(),
            name: instance.name.clone(),
            description: instance.description.clone(),
            host_name: instance.hostname.clone(),
            memory: i64::try_from(instance.memory).unwrap_or(i64::MAX),
            ncpus: i64::from(instance.ncpus),
            time_created: instance.time_created,
            time_modified: instance.time_modified,
            run_state: instance.run_state,
            ..self.clone()
        }
    }
}
