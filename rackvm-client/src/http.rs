//! REST implementation of [`InstanceApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::types::{DiskPath, Disk, DiskResultsPage, Instance, InstanceCreate};
use crate::InstanceApi;

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the control plane, e.g. `https://rack.example.com`.
    pub host: String,
    /// API token sent as a bearer credential.
    pub token: String,
    pub connect_timeout: Duration,
    /// Upper bound for a single request. Lifecycle budgets are applied on top.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Instance API client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: Url,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let host = config.host.trim();
        let base = Url::parse(host)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid host {:?}: {}", host, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "host {:?} cannot be used as a base URL",
                host
            )));
        }

        let token = config.token.trim();
        if token.is_empty() {
            return Err(ClientError::InvalidConfig("API token is empty".to_string()));
        }
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::InvalidConfig("API token is not a valid header".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig(format!("invalid base URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn instance_endpoint(&self, instance: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["v1", "instances", instance];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    /// Send a request and hand back the raw body of a success response.
    async fn execute(&self, method: Method, url: Url, request: RequestBuilder) -> Result<String> {
        let path = url.path().to_string();
        debug!(%method, %path, "Sending request");

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: method.clone(),
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                method: method.clone(),
                path: path.clone(),
                source,
            })?;

        if !status.is_success() {
            debug!(%method, %path, %status, "Request failed");
            return Err(ClientError::from_response(method, &path, status, &body));
        }

        debug!(%method, %path, %status, "Request succeeded");
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        request: RequestBuilder,
    ) -> Result<T> {
        let path = url.path().to_string();
        let body = self.execute(method.clone(), url, request).await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            method,
            path,
            source,
        })
    }
}

#[async_trait]
impl InstanceApi for HttpClient {
    async fn create_instance(&self, project: &str, body: &InstanceCreate) -> Result<Instance> {
        let mut url = self.endpoint(&["v1", "instances"])?;
        url.query_pairs_mut().append_pair("project", project);
        let request = self.client.post(url.clone()).json(body);
        self.execute_json(Method::POST, url, request).await
    }

    async fn view_instance(&self, instance: &str) -> Result<Instance> {
        let url = self.instance_endpoint(instance, &[])?;
        let request = self.client.get(url.clone());
        self.execute_json(Method::GET, url, request).await
    }

    async fn list_instance_disks(&self, instance: &str, limit: u32) -> Result<DiskResultsPage> {
        let mut url = self.instance_endpoint(instance, &["disks"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let request = self.client.get(url.clone());
        self.execute_json(Method::GET, url, request).await
    }

    async fn detach_disk(&self, instance: &str, disk: &str) -> Result<Disk> {
        let url = self.instance_endpoint(instance, &["disks", "detach"])?;
        let body = DiskPath {
            disk: disk.to_string(),
        };
        let request = self.client.post(url.clone()).json(&body);
        self.execute_json(Method::POST, url, request).await
    }

    async fn stop_instance(&self, instance: &str) -> Result<Instance> {
        let url = self.instance_endpoint(instance, &["stop"])?;
        let request = self.client.post(url.clone());
        self.execute_json(Method::POST, url, request).await
    }

    async fn delete_instance(&self, instance: &str) -> Result<()> {
        let url = self.instance_endpoint(instance, &[])?;
        let request = self.client.delete(url.clone());
        self.execute(Method::DELETE, url, request).await?;
        Ok(())
    }
}
