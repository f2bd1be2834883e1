//! Storage credentials and staging defaults
//!
//! Stage-in and stage-out both default to the in-cluster object store; the
//! pre-execution hook replaces the stage-out credentials when the workspace
//! service supplies user-scoped ones.

use serde::{Deserialize, Serialize};

/// Credentials for one object-storage endpoint
///
/// Immutable once resolved for a given run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentials {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: Option<String>,
}

/// Resolved staging configuration for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    pub stage_in: StorageCredentials,
    pub stage_out: StorageCredentials,

    /// Workspace this run stages out to
    pub workspace: String,

    /// Pulsar endpoint used by the stage-out step, when the platform has one
    pub pulsar_url: Option<String>,

    /// Workspace bucket designated for stage-out, from the cluster lookup
    pub access_point: Option<String>,

    /// Platform domain, when configured
    pub domain: Option<String>,

    /// Collection id assigned to the consolidated output
    pub collection_id: String,

    /// Logical process name for registered results
    pub process: String,
}

const DEFAULT_SERVICE_URL: &str = "http://s3-service.zoo.svc.cluster.local:9000";
const DEFAULT_ACCESS_KEY: &str = "minio-admin";
const DEFAULT_SECRET_KEY: &str = "minio-secret-password";
const DEFAULT_REGION: &str = "RegionOne";
const DEFAULT_BUCKET: &str = "eoepca";

impl StageConfig {
    /// Resolve defaults from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve defaults through an injected lookup (used by tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            stage_in: StorageCredentials {
                endpoint: var("STAGEIN_AWS_SERVICEURL", DEFAULT_SERVICE_URL),
                access_key: var("STAGEIN_AWS_ACCESS_KEY_ID", DEFAULT_ACCESS_KEY),
                secret_key: var("STAGEIN_AWS_SECRET_ACCESS_KEY", DEFAULT_SECRET_KEY),
                region: var("STAGEIN_AWS_REGION", DEFAULT_REGION),
                bucket: None,
            },
            stage_out: StorageCredentials {
                endpoint: var("STAGEOUT_AWS_SERVICEURL", DEFAULT_SERVICE_URL),
                access_key: var("STAGEOUT_AWS_ACCESS_KEY_ID", DEFAULT_ACCESS_KEY),
                secret_key: var("STAGEOUT_AWS_SECRET_ACCESS_KEY", DEFAULT_SECRET_KEY),
                region: var("STAGEOUT_AWS_REGION", DEFAULT_REGION),
                bucket: Some(var("STAGEOUT_OUTPUT", DEFAULT_BUCKET)),
            },
            workspace: var("STAGEOUT_WORKSPACE", "default"),
            pulsar_url: lookup("STAGEOUT_PULSAR_URL"),
            access_point: lookup("STAGEOUT_ACCESS_POINT"),
            domain: lookup("WORKSPACE_DOMAIN"),
            collection_id: String::new(),
            process: String::new(),
        }
    }
}
