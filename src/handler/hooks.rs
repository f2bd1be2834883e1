//! Pre/post execution stage handler
//!
//! One handler lives for exactly one run. The pre-hook resolves storage
//! credentials (workspace-provided or statically configured) and the
//! stage-out access point; the post-hook consolidates the run's output
//! catalog into a single collection and optionally registers it with the
//! workspace service. Both hooks run strictly sequentially, one await at a
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use super::proxy::ProxyGuard;
use super::{ExecutionHandler, ExecutionOutcome, HookError};
use crate::auth;
use crate::client::{ConfigMapSource, WorkspaceApi};
use crate::config::{ExecutionConfig, Inputs, LogLink, ServiceLogs, StageConfig};
use crate::stac::{consolidate, Consolidated};
use crate::storage::{S3StorageIo, StorageIo};

const WORKSPACE_CONFIG_MAP: &str = "workspace-config";
const ACCESS_POINT_KEY: &str = "S3_BUCKET_WORKSPACE";
const IMAGE_PULL_SECRETS: &str = "/assets/pod_imagePullSecrets.yaml";
const RESULT_PROCESS: &str = "processing-results";

/// Execution handler wiring platform conventions around one workflow run
pub struct StageHandler {
    config: ExecutionConfig,
    workspace_name: String,
    username: String,
    use_workspace: bool,
    workspace: Option<Arc<dyn WorkspaceApi>>,
    cluster: Option<Arc<dyn ConfigMapSource>>,
    storage_override: Option<Arc<dyn StorageIo>>,
    secrets_path: String,
    feature_collection: Option<String>,
}

impl StageHandler {
    pub fn new(
        config: ExecutionConfig,
        inputs: &Inputs,
        workspace: Option<Arc<dyn WorkspaceApi>>,
        cluster: Option<Arc<dyn ConfigMapSource>>,
    ) -> Self {
        let use_workspace = config.platform.workspace_configured() && workspace.is_some();
        Self {
            config,
            workspace_name: inputs.workspace(),
            username: String::new(),
            use_workspace,
            workspace,
            cluster,
            storage_override: None,
            secrets_path: IMAGE_PULL_SECRETS.to_string(),
            feature_collection: None,
        }
    }

    /// Replace the storage reader built from resolved credentials (tests)
    pub fn with_storage_io(mut self, io: Arc<dyn StorageIo>) -> Self {
        self.storage_override = Some(io);
        self
    }

    /// Override the image-pull-secrets file location (tests)
    pub fn with_secrets_path(mut self, path: impl Into<String>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    pub fn use_workspace(&self) -> bool {
        self.use_workspace
    }

    /// The consolidated collection produced by the post-hook, serialized
    pub fn feature_collection(&self) -> Option<&str> {
        self.feature_collection.as_deref()
    }

    /// Record a failure message for the host to surface
    pub fn set_failure_message(&mut self, message: &str) {
        self.config.lenv.message = Some(message.to_string());
    }

    /// The workspace identifier this run resolves against
    fn workspace_id(&self) -> String {
        format!(
            "{}-{}",
            self.config.platform.workspace_prefix, self.username
        )
    }

    fn storage_io(&self) -> Arc<dyn StorageIo> {
        match &self.storage_override {
            Some(io) => Arc::clone(io),
            None => Arc::new(S3StorageIo::new(
                self.config.stage.stage_out.clone(),
                self.config.stage.access_point.clone(),
            )),
        }
    }

    async fn resolve_access_point(&mut self) {
        let Some(cluster) = &self.cluster else {
            return;
        };
        let namespace = format!("ws-{}", self.workspace_name);
        match cluster.config_map(&namespace, WORKSPACE_CONFIG_MAP).await {
            Ok(data) => {
                if let Some(access_point) = data.get(ACCESS_POINT_KEY) {
                    info!("Found access point {}", access_point);
                    self.config.stage.access_point = Some(access_point.clone());
                }
            }
            Err(e) => {
                info!("Exception when fetching workspace bucket: {}", e);
            }
        }
    }

    fn resolve_username(&mut self) {
        if self.config.auth.jwt.is_empty() {
            return;
        }
        match auth::username_from_token(&self.config.auth.jwt) {
            Ok(username) => self.username = username,
            Err(e) => {
                error!("Failed to decode bearer token: {}", e);
                self.username = String::new();
            }
        }
    }

    async fn resolve_credentials(&mut self) {
        if !self.use_workspace {
            info!("Using pre-configured storage details");
            return;
        }
        info!("Lookup storage details in Workspace");

        // use_workspace implies the client is present
        let Some(workspace) = &self.workspace else {
            self.use_workspace = false;
            return;
        };

        match workspace.workspace_details(&self.workspace_id()).await {
            Ok(details) => {
                info!("Set user bucket settings");
                self.config.stage.stage_out = details.storage.credentials.into_storage_credentials();
            }
            Err(e) => {
                error!("Problem connecting with the Workspace API");
                info!("  {}", e);
                self.use_workspace = false;
                info!("Using pre-configured storage details");
            }
        }
    }

    async fn register(&self, consolidated: &Consolidated) -> Result<(), HookError> {
        let Consolidated::Collection { body, self_href } = consolidated else {
            return Ok(());
        };
        let Some(workspace) = &self.workspace else {
            return Ok(());
        };
        let workspace_id = self.workspace_id();

        info!("Register collection in workspace {}", workspace_id);
        let status = workspace.register_collection(&workspace_id, body).await?;
        info!("Register collection response: {}", status);

        match self_href {
            Some(href) => {
                info!("Register processing results to collection");
                let status = workspace.register_result(&workspace_id, href).await?;
                info!("Register processing results response: {}", status);
            }
            None => {
                info!("No self link on consolidated collection, skipping result registration");
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExecutionHandler for StageHandler {
    async fn pre_execution_hook(&mut self) -> Result<(), HookError> {
        let _proxy = ProxyGuard::clear();
        info!("Pre execution hook");

        self.resolve_access_point().await;
        self.resolve_username();
        self.resolve_credentials().await;

        self.config.stage.collection_id = self.config.lenv.usid.clone();
        self.config.stage.process = RESULT_PROCESS.to_string();
        self.config.stage.workspace = self.workspace_name.clone();

        Ok(())
    }

    async fn post_execution_hook(&mut self, outcome: &ExecutionOutcome) -> Result<(), HookError> {
        let _proxy = ProxyGuard::clear();
        info!("Post execution hook");

        let catalog_uri = outcome
            .stac_catalog_uri()
            .ok_or_else(|| HookError::MissingOutput("StacCatalogUri".to_string()))?;

        let io = self.storage_io();
        let consolidated = consolidate(
            io.as_ref(),
            catalog_uri,
            &self.config.stage.collection_id,
            &self.config.stage.stage_out,
        )
        .await;

        self.feature_collection = Some(consolidated.to_json_string());

        if consolidated.is_empty() {
            return Ok(());
        }
        if self.use_workspace {
            self.register(&consolidated).await?;
        }
        Ok(())
    }

    fn handle_outputs(&mut self, outcome: &ExecutionOutcome) {
        info!("handle_outputs");
        let base = self.config.main.tmp_url.trim_end_matches('/').to_string();
        let run_dir = format!("{}-{}", self.config.lenv.identifier, self.config.lenv.usid);

        let entries: Vec<LogLink> = outcome
            .tool_logs
            .iter()
            .map(|tool_log| {
                let basename = std::path::Path::new(tool_log)
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| tool_log.clone());
                LogLink {
                    url: format!("{}/{}/{}", base, run_dir, basename),
                    title: format!("Tool log {}", basename),
                    rel: "related".to_string(),
                }
            })
            .collect();

        self.config.service_logs = ServiceLogs { entries };
    }

    fn pod_env_vars(&self) -> &HashMap<String, String> {
        &self.config.pod_env_vars
    }

    fn pod_node_selector(&self) -> &HashMap<String, String> {
        &self.config.pod_node_selector
    }

    fn image_pull_secrets(&self) -> HashMap<String, Value> {
        read_yaml_or_empty(&self.secrets_path)
    }

    fn stage_parameters(&self) -> &StageConfig {
        &self.config.stage
    }
}

/// Read a YAML mapping, degrading to empty on a missing or invalid file
fn read_yaml_or_empty(path: &str) -> HashMap<String, Value> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}
