//! Instance lifecycle controller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rackvm_client::{Instance, InstanceApi};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Lifecycle;
use crate::classify::{absent_if_not_found, is_not_found};
use crate::error::{LifecycleError, Operation, Step};
use crate::model::{ResourceSpec, ResourceState};
use crate::poller::{self, POLL_INTERVAL};
use crate::timeouts::TimeoutBudget;
use crate::translate::translate;

/// Page size for the attached-disk listing. Large enough to fetch everything
/// in a single call.
pub const DISK_LIST_LIMIT: u32 = 1_000_000_000;

/// Drives instances through create, read and delete on the control plane.
pub struct InstanceController<C: ?Sized> {
    client: Arc<C>,
    poll_interval: Duration,
}

impl<C> InstanceController<C>
where
    C: InstanceApi + ?Sized + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the delay between run-state polls during delete.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Detach disks, stop, wait for `stopped`, then delete.
    ///
    /// A not-found at any step means the instance is already gone.
    async fn teardown(&self, id: &str) -> Result<(), LifecycleError> {
        let listed = self.client.list_instance_disks(id, DISK_LIST_LIMIT).await;
        let disks = match absent_if_not_found(listed).map_err(LifecycleError::remote(Step::ListDisks))? {
            Some(page) => page.items,
            None => {
                warn!(instance_id = %id, "Instance not found while listing disks");
                Vec::new()
            }
        };
        debug!(instance_id = %id, count = disks.len(), "Listed attached disks");

        for disk in &disks {
            let detached = self.client.detach_disk(id, &disk.id).await;
            let step = Step::DetachDisk {
                disk: disk.id.clone(),
            };
            match absent_if_not_found(detached).map_err(LifecycleError::remote(step))? {
                Some(_) => debug!(instance_id = %id, disk_id = %disk.id, disk_name = %disk.name, "Detached disk"),
                None => warn!(instance_id = %id, disk_id = %disk.id, "Disk already detached"),
            }
        }

        let stopped = self.client.stop_instance(id).await;
        if absent_if_not_found(stopped)
            .map_err(LifecycleError::remote(Step::StopInstance))?
            .is_none()
        {
            warn!(instance_id = %id, "Instance not found on stop, treating as deleted");
            return Ok(());
        }
        debug!(instance_id = %id, "Stop requested");

        match self.await_stopped(id).await? {
            Some(instance) => {
                debug!(instance_id = %id, run_state = %instance.run_state, "Instance stopped")
            }
            None => {
                warn!(instance_id = %id, "Instance vanished while stopping, treating as deleted");
                return Ok(());
            }
        }

        let deleted = self.client.delete_instance(id).await;
        if absent_if_not_found(deleted)
            .map_err(LifecycleError::remote(Step::DeleteInstance))?
            .is_none()
        {
            warn!(instance_id = %id, "Instance not found on delete, treating as deleted");
        }
        Ok(())
    }

    /// Run the stop poll on its own task and wait for its verdict.
    ///
    /// The task is aborted if this future is dropped, so an expired budget
    /// also ends the poll. `Ok(None)` means the instance is gone.
    async fn await_stopped(&self, id: &str) -> Result<Option<Instance>, LifecycleError> {
        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);
        let instance_id = id.to_string();
        let interval = self.poll_interval;

        let _poll = AbortOnDrop(tokio::spawn(async move {
            let result = poller::wait_for_stopped(&*client, &instance_id, interval).await;
            let _ = tx.send(result);
        }));

        let result = rx.await.map_err(|_| LifecycleError::PollAborted { id: id.to_string() })?;
        absent_if_not_found(result).map_err(LifecycleError::remote(Step::WaitStopped))
    }
}

#[async_trait]
impl<C> Lifecycle for InstanceController<C>
where
    C: InstanceApi + ?Sized + 'static,
{
    type Spec = ResourceSpec;
    type State = ResourceState;

    async fn create(
        &self,
        spec: &ResourceSpec,
        budget: &TimeoutBudget,
    ) -> Result<ResourceState, LifecycleError> {
        let request = translate(spec)?;
        info!(name = %spec.name, project = %request.project, "Creating instance");

        let instance = bounded(Operation::Create, budget.create, async {
            self.client
                .create_instance(&request.project, &request.body)
                .await
                .map_err(LifecycleError::remote(Step::CreateInstance))
        })
        .await?;

        info!(instance_id = %instance.id, run_state = %instance.run_state, "Instance created");
        Ok(ResourceState::created(spec, &instance))
    }

    async fn read(
        &self,
        state: &ResourceState,
        budget: &TimeoutBudget,
    ) -> Result<ResourceState, LifecycleError> {
        debug!(instance_id = %state.id, "Reading instance");

        let instance = bounded(Operation::Read, budget.read, async {
            self.client.view_instance(&state.id).await.map_err(|e| {
                if is_not_found(&e) {
                    LifecycleError::Gone {
                        id: state.id.clone(),
                    }
                } else {
                    LifecycleError::remote(Step::ViewInstance)(e)
                }
            })
        })
        .await?;

        Ok(state.refreshed(&instance))
    }

    async fn update(
        &self,
        state: &ResourceState,
        _spec: &ResourceSpec,
        _budget: &TimeoutBudget,
    ) -> Result<ResourceState, LifecycleError> {
        debug!(instance_id = %state.id, "Rejecting instance update");
        Err(LifecycleError::Unsupported)
    }

    async fn delete(&self, state: &ResourceState, budget: &TimeoutBudget) -> Result<(), LifecycleError> {
        info!(instance_id = %state.id, "Deleting instance");
        bounded(Operation::Delete, budget.delete, self.teardown(&state.id)).await?;
        info!(instance_id = %state.id, "Instance deleted");
        Ok(())
    }
}

/// Run `fut` under a single budget window.
async fn bounded<T, F>(operation: Operation, budget: Duration, fut: F) -> Result<T, LifecycleError>
where
    F: Future<Output = Result<T, LifecycleError>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%operation, ?budget, "Operation timed out");
            Err(LifecycleError::Timeout { operation, budget })
        }
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
