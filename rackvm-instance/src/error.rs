//! Lifecycle error types.

use std::fmt;
use std::time::Duration;

use rackvm_client::ClientError;
use thiserror::Error;

use crate::translate::TranslateError;

/// Lifecycle operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// Remote step an operation was performing when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateInstance,
    ViewInstance,
    ListDisks,
    DetachDisk { disk: String },
    StopInstance,
    WaitStopped,
    DeleteInstance,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateInstance => f.write_str("create instance"),
            Step::ViewInstance => f.write_str("view instance"),
            Step::ListDisks => f.write_str("list attached disks"),
            Step::DetachDisk { disk } => write!(f, "detach disk {}", disk),
            Step::StopInstance => f.write_str("stop instance"),
            Step::WaitStopped => f.write_str("wait for instance to stop"),
            Step::DeleteInstance => f.write_str("delete instance"),
        }
    }
}

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The declared spec is structurally invalid. Nothing was sent.
    #[error("invalid instance configuration: {0}")]
    Validation(#[from] TranslateError),

    /// Read found no instance behind a recorded ID.
    #[error("instance {id} no longer exists")]
    Gone { id: String },

    #[error("the control plane does not support updating instances")]
    Unsupported,

    /// A remote call failed with something other than a tolerated not-found.
    #[error("failed to {step}: {source}")]
    Remote {
        step: Step,
        #[source]
        source: ClientError,
    },

    /// The operation ran out of budget.
    #[error("{operation} timed out after {budget:?}")]
    Timeout { operation: Operation, budget: Duration },

    /// The stop-wait task ended without reporting a result.
    #[error("stop wait for instance {id} ended without a result")]
    PollAborted { id: String },
}

impl LifecycleError {
    pub(crate) fn remote(step: Step) -> impl FnOnce(ClientError) -> Self {
        move |source| LifecycleError::Remote { step, source }
    }

    /// True for failures caused by the budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LifecycleError::Timeout { .. })
    }
}
