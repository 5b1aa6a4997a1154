//! Run-state polling.

use std::time::Duration;

use rackvm_client::{ClientError, Instance, InstanceApi, InstanceState};
use tracing::debug;

/// Delay between consecutive views of the instance.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// View `id` every `interval` until `target` accepts its run state.
///
/// There is no deadline and no attempt cap here; callers bound the wait by
/// dropping or aborting the future. The first failed view is returned as-is,
/// including not-found.
pub async fn wait_for_run_state<C, F>(
    client: &C,
    id: &str,
    interval: Duration,
    mut target: F,
) -> Result<Instance, ClientError>
where
    C: InstanceApi + ?Sized,
    F: FnMut(InstanceState) -> bool,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let instance = client.view_instance(id).await?;
        if target(instance.run_state) {
            debug!(instance_id = %id, run_state = %instance.run_state, attempt, "Run state reached");
            return Ok(instance);
        }
        debug!(instance_id = %id, run_state = %instance.run_state, attempt, "Waiting for run state");
        tokio::time::sleep(interval).await;
    }
}

/// Wait until the instance reports `stopped`.
pub async fn wait_for_stopped<C>(
    client: &C,
    id: &str,
    interval: Duration,
) -> Result<Instance, ClientError>
where
    C: InstanceApi + ?Sized,
{
    wait_for_run_state(client, id, interval, |state| state == InstanceState::Stopped).await
}
