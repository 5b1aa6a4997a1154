//! Declared spec to create-request translation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rackvm_client::{
    ExternalIpCreate, InstanceCreate, InstanceDiskAttachment, InstanceNetworkInterfaceAttachment,
};
use thiserror::Error;

use crate::model::ResourceSpec;
use crate::token::{UnquoteError, unquote};

/// Largest accepted user-data payload, measured after Base64 decoding.
pub const USER_DATA_MAX_BYTES: usize = 32 * 1024;

/// A validated create call: target project plus request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub project: String,
    pub body: InstanceCreate,
}

/// Structural problems found while translating a spec. Never retried.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{field}: malformed token {token:?}: {source}")]
    MalformedToken {
        field: &'static str,
        token: String,
        #[source]
        source: UnquoteError,
    },

    #[error("{field}: {value} is out of range ({min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("user_data: not valid Base64: {0}")]
    UserDataEncoding(#[from] base64::DecodeError),

    #[error("user_data: decoded payload is {size} bytes, limit is {max}")]
    UserDataTooLarge { size: usize, max: usize },
}

/// Build the create request for `spec`.
///
/// Either every list token decodes or nothing is returned; a partial
/// attachment list is never produced.
pub fn translate(spec: &ResourceSpec) -> Result<CreateRequest, TranslateError> {
    let memory = in_range("memory", spec.memory, 1, i64::MAX)? as u64;
    let ncpus = in_range("ncpus", spec.ncpus, 1, i64::from(u16::MAX))? as u16;

    let disks = unquote_all("attach_to_disks", &spec.attach_to_disks)?
        .into_iter()
        .map(|name| InstanceDiskAttachment::Attach { name })
        .collect();
    let external_ips = unquote_all("external_ips", &spec.external_ips)?
        .into_iter()
        .map(|pool_name| ExternalIpCreate::Ephemeral { pool_name })
        .collect();

    let user_data = match &spec.user_data {
        Some(encoded) => {
            check_user_data(encoded)?;
            encoded.clone()
        }
        None => String::new(),
    };

    Ok(CreateRequest {
        project: spec.project_id.clone(),
        body: InstanceCreate {
            name: spec.name.clone(),
            description: spec.description.clone(),
            hostname: spec.host_name.clone(),
            memory,
            ncpus,
            start: spec.start_on_create(),
            // Interfaces are managed as their own resource.
            network_interfaces: InstanceNetworkInterfaceAttachment::None,
            disks,
            external_ips,
            user_data,
        },
    })
}

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64, TranslateError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(TranslateError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn unquote_all(field: &'static str, tokens: &[String]) -> Result<Vec<String>, TranslateError> {
    tokens
        .iter()
        .map(|token| {
            unquote(token).map_err(|source| TranslateError::MalformedToken {
                field,
                token: token.clone(),
                source,
            })
        })
        .collect()
}

fn check_user_data(encoded: &str) -> Result<(), TranslateError> {
    let decoded = STANDARD.decode(encoded)?;
    if decoded.len() > USER_DATA_MAX_BYTES {
        return Err(TranslateError::UserDataTooLarge {
            size: decoded.len(),
            max: USER_DATA_MAX_BYTES,
        });
    }
    Ok(())
}
