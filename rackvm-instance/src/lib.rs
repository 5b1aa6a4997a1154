//! rackvm-instance: lifecycle controller for rack compute instances.
//!
//! The controller reconciles a declared instance against the control plane:
//! - Create translates the declared spec and provisions the instance
//! - Read refreshes the recorded state, failing if the instance disappeared
//! - Update is rejected; the control plane cannot modify instances
//! - Delete detaches disks, stops the instance, waits for it to halt and
//!   removes it, treating "not found" at any step as already done
//!
//! Every operation runs inside its own timeout budget.

pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod poller;
pub mod timeouts;
pub mod token;
pub mod translate;

pub use config::{ConfigError, InstanceConfig};
pub use error::{LifecycleError, Operation, Step};
pub use lifecycle::{InstanceController, Lifecycle};
pub use model::{ResourceSpec, ResourceState};
pub use timeouts::{DEFAULT_TIMEOUT, TimeoutBudget, TimeoutsConfig};
pub use translate::{CreateRequest, TranslateError, translate};
