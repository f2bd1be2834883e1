//! Workspace service client
//!
//! The workspace API hands out user-scoped storage credentials and accepts
//! result registrations. Registration calls are fire-and-forget: their
//! status codes are logged by the caller, never branched on, never retried.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::StorageCredentials;

/// Errors raised by workspace API calls
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Workspace API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Credentials block of a workspace details response
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceCredentials {
    pub endpoint: String,
    pub access: String,
    pub secret: String,
    pub region: String,
    pub bucketname: String,
}

impl WorkspaceCredentials {
    pub fn into_storage_credentials(self) -> StorageCredentials {
        StorageCredentials {
            endpoint: self.endpoint,
            access_key: self.access,
            secret_key: self.secret,
            region: self.region,
            bucket: Some(self.bucketname),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceStorage {
    pub credentials: WorkspaceCredentials,
}

/// `GET /workspaces/{name}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceDetails {
    pub storage: WorkspaceStorage,
}

/// Workspace API seam
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Fetch a workspace's storage details; non-2xx is an error the caller
    /// recovers from by keeping its configured defaults.
    async fn workspace_details(&self, workspace: &str) -> Result<WorkspaceDetails, WorkspaceError>;

    /// Register a consolidated collection document; returns the status code.
    async fn register_collection(
        &self,
        workspace: &str,
        collection: &Value,
    ) -> Result<u16, WorkspaceError>;

    /// Register a processing-result pointer; returns the status code.
    async fn register_result(&self, workspace: &str, url: &str) -> Result<u16, WorkspaceError>;
}

/// reqwest-backed workspace client
#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl WorkspaceClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn workspace_url(&self, workspace: &str) -> String {
        format!("{}/workspaces/{}", self.base_url, workspace)
    }
}

#[async_trait]
impl WorkspaceApi for WorkspaceClient {
    async fn workspace_details(&self, workspace: &str) -> Result<WorkspaceDetails, WorkspaceError> {
        let url = self.workspace_url(workspace);
        info!("Using Workspace API endpoint {}", url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkspaceError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    async fn register_collection(
        &self,
        workspace: &str,
        collection: &Value,
    ) -> Result<u16, WorkspaceError> {
        let url = format!("{}/register-json", self.workspace_url(workspace));
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
            .json(collection)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn register_result(&self, workspace: &str, url: &str) -> Result<u16, WorkspaceError> {
        let endpoint = format!("{}/register", self.workspace_url(workspace));
        let response = self
            .client
            .post(&endpoint)
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
            .json(&json!({"type": "stac-item", "url": url}))
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}
