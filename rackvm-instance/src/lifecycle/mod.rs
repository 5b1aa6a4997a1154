//! Lifecycle controllers.
//!
//! A controller takes the declared spec and/or the last recorded state from
//! its host and drives the control plane towards it. Controllers keep no
//! state between calls; the host persists whatever they return.

pub mod instance;

use async_trait::async_trait;

use crate::error::LifecycleError;
use crate::timeouts::TimeoutBudget;

pub use instance::InstanceController;

/// Create/Read/Update/Delete for one resource kind.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Declared attributes.
    type Spec;
    /// Observed attributes, persisted by the host between calls.
    type State;

    async fn create(
        &self,
        spec: &Self::Spec,
        budget: &TimeoutBudget,
    ) -> Result<Self::State, LifecycleError>;

    async fn read(
        &self,
        state: &Self::State,
        budget: &TimeoutBudget,
    ) -> Result<Self::State, LifecycleError>;

    async fn update(
        &self,
        state: &Self::State,
        spec: &Self::Spec,
        budget: &TimeoutBudget,
    ) -> Result<Self::State, LifecycleError>;

    /// Remove the resource. Succeeds if it is already gone.
    async fn delete(&self, state: &Self::State, budget: &TimeoutBudget) -> Result<(), LifecycleError>;
}
