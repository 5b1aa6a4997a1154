//! Client for the rack control plane instance API.
//!
//! The [`InstanceApi`] trait is the seam the lifecycle controller depends on;
//! [`HttpClient`] is the REST implementation used in production.

pub mod error;
pub mod http;
pub mod types;

use async_trait::async_trait;

pub use error::{ClientError, Result};
pub use http::{ClientConfig, HttpClient};
pub use reqwest::{Method, StatusCode};
pub use types::{
    ApiErrorBody, Disk, DiskPath, DiskResultsPage, DiskState, ExternalIpCreate, Instance,
    InstanceCreate, InstanceDiskAttachment, InstanceNetworkInterfaceAttachment, InstanceState,
};

/// Instance operations exposed by the control plane.
///
/// Every method is a single request; none of them retry.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Provision an instance inside `project`.
    async fn create_instance(&self, project: &str, body: &InstanceCreate) -> Result<Instance>;

    /// Fetch an instance by ID or name.
    async fn view_instance(&self, instance: &str) -> Result<Instance>;

    /// List disks attached to an instance, at most `limit` per page.
    async fn list_instance_disks(&self, instance: &str, limit: u32) -> Result<DiskResultsPage>;

    /// Detach one disk from an instance.
    async fn detach_disk(&self, instance: &str, disk: &str) -> Result<Disk>;

    /// Request an asynchronous stop. The returned instance is usually still `stopping`.
    async fn stop_instance(&self, instance: &str) -> Result<Instance>;

    /// Permanently remove a stopped instance.
    async fn delete_instance(&self, instance: &str) -> Result<()>;
}
