//! Declared instance configuration and persisted state files.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::model::{ResourceSpec, ResourceState};
use crate::timeouts::TimeoutsConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Instance configuration as written by the user.
///
/// List elements are kept as raw JSON values. Each one is rendered back to
/// JSON text and handed to the translator as a quoted token, so `"boot"`
/// becomes the token `"boot"` while a stray number stays unquoted and is
/// rejected there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub host_name: String,
    pub memory: i64,
    pub ncpus: i64,
    #[serde(default)]
    pub start_on_create: Option<bool>,
    #[serde(default)]
    pub attach_to_disks: Vec<Value>,
    #[serde(default)]
    pub external_ips: Vec<Value>,
    #[serde(default)]
    pub user_data: Option<String>,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

impl InstanceConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path).await
    }

    pub fn into_spec(self) -> ResourceSpec {
        ResourceSpec {
            project_id: self.project_id,
            name: self.name,
            description: self.description,
            host_name: self.host_name,
            memory: self.memory,
            ncpus: self.ncpus,
            start_on_create: self.start_on_create,
            attach_to_disks: self.attach_to_disks.iter().map(Value::to_string).collect(),
            external_ips: self.external_ips.iter().map(Value::to_string).collect(),
            user_data: self.user_data,
            timeouts: self.timeouts,
        }
    }
}

/// Read a state file previously written from a [`ResourceState`].
pub async fn load_state(path: &Path) -> Result<ResourceState, ConfigError> {
    load_json(path).await
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
