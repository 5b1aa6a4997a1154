//! Client error types.

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::types::ApiErrorBody;

/// Errors returned by instance API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The control plane answered with a non-success status.
    #[error("{method} {path} returned {status}: {message}")]
    Http {
        method: Method,
        path: String,
        status: StatusCode,
        error_code: Option<String>,
        request_id: Option<String>,
        message: String,
    },

    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// A success response carried a body we could not decode.
    #[error("{method} {path} returned an unreadable body: {source}")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be built from its configuration.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Build an [`ClientError::Http`] from a failed response body.
    ///
    /// The body is decoded as the control plane's error envelope when possible;
    /// otherwise the raw text becomes the message.
    pub fn from_response(method: Method, path: &str, status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(envelope) => ClientError::Http {
                method,
                path: path.to_string(),
                status,
                error_code: envelope.error_code,
                request_id: envelope.request_id,
                message: envelope.message,
            },
            Err(_) => {
                let text = body.trim();
                let message = if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    text.to_string()
                };
                ClientError::Http {
                    method,
                    path: path.to_string(),
                    status,
                    error_code: None,
                    request_id: None,
                    message,
                }
            }
        }
    }

    /// HTTP status attached to this error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status(),
            ClientError::Decode { .. } | ClientError::InvalidConfig(_) => None,
        }
    }

    /// Machine-readable error code from the error envelope.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ClientError::Http { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }
}

/// Result type for instance API calls.
pub type Result<T> = std::result::Result<T, ClientError>;
