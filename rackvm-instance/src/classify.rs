//! Not-found classification for control plane errors.

use rackvm_client::{ClientError, StatusCode};

/// True when the control plane reported the object as missing.
pub fn is_not_found(err: &ClientError) -> bool {
    err.status() == Some(StatusCode::NOT_FOUND)
}

/// Fold a not-found failure into `Ok(None)`; other errors pass through.
pub fn absent_if_not_found<T>(result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}
