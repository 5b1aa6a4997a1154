//! Scripted in-memory control plane for lifecycle tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rackvm_client::{
    ClientError, Disk, DiskResultsPage, DiskState, Instance, InstanceApi, InstanceCreate,
    InstanceDiskAttachment, InstanceState, Method, Result, StatusCode,
};
use rackvm_instance::{ResourceSpec, TimeoutsConfig};
use tokio::time::Instant;

/// Remote operation, used to inject failures and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    View,
    ListDisks,
    Detach,
    Stop,
    Delete,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { project: String, name: String },
    View(String),
    ListDisks { instance: String, limit: u32 },
    Detach { instance: String, disk: String },
    Stop(String),
    Delete(String),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::Create { .. } => Op::Create,
            Call::View(_) => Op::View,
            Call::ListDisks { .. } => Op::ListDisks,
            Call::Detach { .. } => Op::Detach,
            Call::Stop(_) => Op::Stop,
            Call::Delete(_) => Op::Delete,
        }
    }
}

/// What views report after a stop has been requested.
#[derive(Debug, Clone)]
pub enum StopBehavior {
    /// Report these states in order, then `stopped`.
    Script(Vec<InstanceState>),
    /// Report `stopping` forever.
    Never,
    /// Report `stopping` this many times, then the instance disappears.
    VanishesAfter(u32),
}

impl StopBehavior {
    pub fn stops_after(polls: usize) -> Self {
        StopBehavior::Script(vec![InstanceState::Stopping; polls])
    }
}

enum Pending {
    Script(VecDeque<InstanceState>),
    Never,
    VanishesAfter(u32),
}

struct Inner {
    instances: HashMap<String, Instance>,
    disks: HashMap<String, Vec<Disk>>,
    pending: HashMap<String, Pending>,
    failures: HashMap<Op, StatusCode>,
    stop_behavior: StopBehavior,
    latency: Duration,
    calls: Vec<(Instant, Call)>,
    creates: Vec<(String, InstanceCreate)>,
    next_id: u32,
}

pub struct FakeApi {
    inner: Mutex<Inner>,
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn status_error(method: Method, path: String, status: StatusCode) -> ClientError {
    ClientError::from_response(
        method,
        &path,
        status,
        &format!(r#"{{"request_id":"fake","message":"injected {}"}}"#, status.as_u16()),
    )
}

fn not_found(method: Method, path: String) -> ClientError {
    ClientError::from_response(
        method,
        &path,
        StatusCode::NOT_FOUND,
        r#"{"request_id":"fake","error_code":"ObjectNotFound","message":"not found"}"#,
    )
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                instances: HashMap::new(),
                disks: HashMap::new(),
                pending: HashMap::new(),
                failures: HashMap::new(),
                stop_behavior: StopBehavior::stops_after(0),
                latency: Duration::ZERO,
                calls: Vec::new(),
                creates: Vec::new(),
                next_id: 0,
            }),
        })
    }

    /// Seed an instance directly, bypassing create.
    pub fn insert_instance(&self, name: &str, run_state: InstanceState) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = format!("inst-{}", inner.next_id);
        inner.instances.insert(
            id.clone(),
            Instance {
                id: id.clone(),
                name: name.to_string(),
                description: "seeded".to_string(),
                hostname: name.to_string(),
                memory: 1 << 30,
                ncpus: 2,
                project_id: "acc-project".to_string(),
                run_state,
                time_created: epoch(),
                time_modified: epoch(),
                time_run_state_updated: epoch(),
            },
        );
        id
    }

    pub fn attach_disk(&self, instance: &str, disk_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .disks
            .entry(instance.to_string())
            .or_default()
            .push(Disk {
                id: disk_id.to_string(),
                name: format!("{}-name", disk_id),
                description: String::new(),
                project_id: "acc-project".to_string(),
                size: 1 << 30,
                state: Some(DiskState::Attached {
                    instance: instance.to_string(),
                }),
            });
    }

    pub fn modify(&self, instance: &str, f: impl FnOnce(&mut Instance)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(i) = inner.instances.get_mut(instance) {
            f(i);
        }
    }

    pub fn remove_instance(&self, instance: &str) {
        self.inner.lock().unwrap().instances.remove(instance);
    }

    pub fn contains(&self, instance: &str) -> bool {
        self.inner.lock().unwrap().instances.contains_key(instance)
    }

    /// Fail every call of `op` with `status`.
    pub fn fail(&self, op: Op, status: StatusCode) {
        self.inner.lock().unwrap().failures.insert(op, status);
    }

    pub fn set_stop_behavior(&self, behavior: StopBehavior) {
        self.inner.lock().unwrap().stop_behavior = behavior;
    }

    /// Delay every call by `latency` before it is answered.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().unwrap().latency = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().map(|(t, _)| *t).collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    pub fn creates(&self) -> Vec<(String, InstanceCreate)> {
        self.inner.lock().unwrap().creates.clone()
    }

    /// Record `call`, wait out the latency, then report any injected failure.
    async fn enter(&self, call: Call, method: Method, path: String) -> Result<()> {
        let (latency, failure) = {
            let mut inner = self.inner.lock().unwrap();
            let op = call.op();
            inner.calls.push((Instant::now(), call));
            (inner.latency, inner.failures.get(&op).copied())
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(status) => Err(status_error(method, path, status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InstanceApi for FakeApi {
    async fn create_instance(&self, project: &str, body: &InstanceCreate) -> Result<Instance> {
        let path = "/v1/instances".to_string();
        let call = Call::Create {
            project: project.to_string(),
            name: body.name.clone(),
        };
        self.enter(call, Method::POST, path).await?;

        let mut inner = self.inner.lock().unwrap();
        inner.creates.push((project.to_string(), body.clone()));
        inner.next_id += 1;
        let id = format!("inst-{}", inner.next_id);

        let disks = body
            .disks
            .iter()
            .map(|InstanceDiskAttachment::Attach { name }| Disk {
                id: format!("disk-{}", name),
                name: name.clone(),
                description: String::new(),
                project_id: project.to_string(),
                size: 1 << 30,
                state: Some(DiskState::Attached {
                    instance: id.clone(),
                }),
            })
            .collect();
        inner.disks.insert(id.clone(), disks);

        let instance = Instance {
            id: id.clone(),
            name: body.name.clone(),
            description: body.description.clone(),
            hostname: body.hostname.clone(),
            memory: body.memory,
            ncpus: body.ncpus,
            project_id: project.to_string(),
            run_state: if body.start {
                InstanceState::Starting
            } else {
                InstanceState::Stopped
            },
            time_created: epoch(),
            time_modified: epoch() + chrono::Duration::seconds(1),
            time_run_state_updated: epoch(),
        };
        inner.instances.insert(id, instance.clone());
        Ok(instance)
    }

    async fn view_instance(&self, instance: &str) -> Result<Instance> {
        let path = format!("/v1/instances/{}", instance);
        self.enter(Call::View(instance.to_string()), Method::GET, path.clone())
            .await?;

        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        if let Some(pending) = inner.pending.get_mut(instance) {
            let next = match pending {
                Pending::Script(states) => Some(states.pop_front().unwrap_or(InstanceState::Stopped)),
                Pending::Never => Some(InstanceState::Stopping),
                Pending::VanishesAfter(0) => None,
                Pending::VanishesAfter(n) => {
                    *n -= 1;
                    Some(InstanceState::Stopping)
                }
            };
            match next {
                Some(state) => {
                    if state == InstanceState::Stopped {
                        inner.pending.remove(instance);
                    }
                    if let Some(i) = inner.instances.get_mut(instance) {
                        i.run_state = state;
                    }
                }
                None => {
                    inner.pending.remove(instance);
                    inner.instances.remove(instance);
                }
            }
        }

        inner
            .instances
            .get(instance)
            .cloned()
            .ok_or_else(|| not_found(Method::GET, path))
    }

    async fn list_instance_disks(&self, instance: &str, limit: u32) -> Result<DiskResultsPage> {
        let path = format!("/v1/instances/{}/disks", instance);
        let call = Call::ListDisks {
            instance: instance.to_string(),
            limit,
        };
        self.enter(call, Method::GET, path.clone()).await?;

        let inner = self.inner.lock().unwrap();
        if !inner.instances.contains_key(instance) {
            return Err(not_found(Method::GET, path));
        }
        Ok(DiskResultsPage {
            items: inner.disks.get(instance).cloned().unwrap_or_default(),
            next_page: None,
        })
    }

    async fn detach_disk(&self, instance: &str, disk: &str) -> Result<Disk> {
        let path = format!("/v1/instances/{}/disks/detach", instance);
        let call = Call::Detach {
            instance: instance.to_string(),
            disk: disk.to_string(),
        };
        self.enter(call, Method::POST, path.clone()).await?;

        let mut inner = self.inner.lock().unwrap();
        if !inner.instances.contains_key(instance) {
            return Err(not_found(Method::POST, path));
        }
        let attached = inner.disks.entry(instance.to_string()).or_default();
        match attached.iter().position(|d| d.id == disk) {
            Some(index) => {
                let mut removed = attached.remove(index);
                removed.state = Some(DiskState::Detached);
                Ok(removed)
            }
            None => Err(not_found(Method::POST, path)),
        }
    }

    async fn stop_instance(&self, instance: &str) -> Result<Instance> {
        let path = format!("/v1/instances/{}/stop", instance);
        self.enter(Call::Stop(instance.to_string()), Method::POST, path.clone())
            .await?;

        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let Some(current) = inner.instances.get_mut(instance) else {
            return Err(not_found(Method::POST, path));
        };
        if current.run_state != InstanceState::Stopped {
            current.run_state = InstanceState::Stopping;
            let pending = match &inner.stop_behavior {
                StopBehavior::Script(states) => Pending::Script(states.iter().copied().collect()),
                StopBehavior::Never => Pending::Never,
                StopBehavior::VanishesAfter(n) => Pending::VanishesAfter(*n),
            };
            inner.pending.insert(instance.to_string(), pending);
        }
        Ok(current.clone())
    }

    async fn delete_instance(&self, instance: &str) -> Result<()> {
        let path = format!("/v1/instances/{}", instance);
        self.enter(Call::Delete(instance.to_string()), Method::DELETE, path.clone())
            .await?;

        let mut inner = self.inner.lock().unwrap();
        let run_state = inner.instances.get(instance).map(|i| i.run_state);
        match run_state {
            None => Err(not_found(Method::DELETE, path)),
            Some(state) if state != InstanceState::Stopped => Err(status_error(
                Method::DELETE,
                path,
                StatusCode::BAD_REQUEST,
            )),
            Some(_) => {
                inner.instances.remove(instance);
                inner.disks.remove(instance);
                Ok(())
            }
        }
    }
}

/// The declared spec used across lifecycle tests.
pub fn acc_spec() -> ResourceSpec {
    ResourceSpec {
        project_id: "acc-project".to_string(),
        name: "acc-instance".to_string(),
        description: "a test".to_string(),
        host_name: "acc-host".to_string(),
        memory: 1_073_741_824,
        ncpus: 2,
        start_on_create: None,
        attach_to_disks: vec![],
        external_ips: vec![],
        user_data: None,
        timeouts: TimeoutsConfig::default(),
    }
}
