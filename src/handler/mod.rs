//! Execution hooks
//!
//! This module contains:
//! - `hooks` - the stage handler run before and after a workflow execution
//! - `proxy` - the HTTP proxy suppression guard
//!
//! The execution engine invokes the handler through [`ExecutionHandler`]:
//! the pre-hook before scheduling the workflow, the post-hook and output
//! handling after it finishes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::TokenError;
use crate::client::{ClusterError, WorkspaceError};
use crate::config::{ConfigError, StageConfig};
use crate::storage::StorageError;

pub mod hooks;
pub mod proxy;

pub use hooks::StageHandler;
pub use proxy::ProxyGuard;

/// Errors raised inside an execution hook
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Missing execution output: {0}")]
    MissingOutput(String),
}

/// What the execution engine hands back after a run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the engine reported success
    #[serde(default)]
    pub success: bool,

    /// Application log location, when the engine collected one
    #[serde(default)]
    pub log: Option<String>,

    /// Declared outputs; the stage-out step writes `StacCatalogUri` here
    #[serde(default)]
    pub output: HashMap<String, String>,

    /// Usage/metrics report, passed through untouched
    #[serde(default)]
    pub usage_report: Option<Value>,

    /// Paths of per-step tool logs
    #[serde(default)]
    pub tool_logs: Vec<String>,
}

impl ExecutionOutcome {
    pub fn stac_catalog_uri(&self) -> Option<&str> {
        self.output.get("StacCatalogUri").map(String::as_str)
    }
}

/// The hook seam the execution engine drives
#[async_trait]
pub trait ExecutionHandler: Send + Sync {
    /// Runs before the workflow is scheduled
    async fn pre_execution_hook(&mut self) -> Result<(), HookError>;

    /// Runs after the workflow finishes
    async fn post_execution_hook(&mut self, outcome: &ExecutionOutcome) -> Result<(), HookError>;

    /// Propagate tool logs into the host's status response
    fn handle_outputs(&mut self, outcome: &ExecutionOutcome);

    /// Environment variables the engine injects into workflow pods
    fn pod_env_vars(&self) -> &HashMap<String, String>;

    /// Node selector the engine applies to workflow pods
    fn pod_node_selector(&self) -> &HashMap<String, String>;

    /// Image pull secrets loaded from the deployment assets
    fn image_pull_secrets(&self) -> HashMap<String, Value>;

    /// Parameters the stage-in/stage-out steps are templated with
    fn stage_parameters(&self) -> &StageConfig;
}
