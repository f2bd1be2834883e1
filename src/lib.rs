//! # eo-stageout
//!
//! Execution hooks and stage-out result publishing for Earth-observation
//! processing services.
//!
//! A WPS host runs CWL-described container pipelines through an external
//! execution engine; this crate supplies the platform glue around one run:
//!
//! - **Pre-execution hook** - resolves storage credentials (workspace-scoped
//!   or statically configured) and the stage-out access point
//! - **Post-execution hook** - consolidates the run's STAC output catalog
//!   into a single collection and optionally registers it with the
//!   workspace service
//! - **Runner glue** - wires hooks, engine, and host output slots together
//!
//! The workflow engine, cluster orchestrator, and workspace API stay
//! external; each plugs in through a trait (`WorkflowExecutor`,
//! `ConfigMapSource`, `WorkspaceApi`, `StorageIo`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eo_stageout::prelude::*;
//!
//! # async fn run(executor: Arc<dyn WorkflowExecutor>) -> anyhow::Result<()> {
//! let conf: serde_json::Value = serde_json::from_str(r#"{
//!     "main": {"tmpUrl": "http://host/tmp", "tmpPath": "/tmp/runs"},
//!     "lenv": {"Identifier": "water-bodies", "usid": "run-42"},
//!     "eoepca": {
//!         "workspace_url": "https://workspace-api.demo",
//!         "workspace_prefix": "ws"
//!     }
//! }"#)?;
//!
//! let config = ExecutionConfig::from_value(conf)?;
//! let workspace = Arc::new(WorkspaceClient::new(
//!     &config.platform.workspace_url,
//!     &config.auth.jwt,
//! ));
//!
//! let inputs = Inputs::default();
//! let mut handler = StageHandler::new(config, &inputs, Some(workspace), None);
//! let mut outputs = Outputs::default();
//!
//! let runner = Runner::from_cwl_file("app-package.cwl", executor)?;
//! let status = runner.execute(&mut handler, &inputs, &mut outputs).await;
//! println!("finished with status {}", status.code());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod handler;
pub mod runner;
pub mod stac;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use auth::{username_from_claims, username_from_token, TokenError};
pub use client::{
    ClusterError, ConfigMapSource, KubeConfigMaps, WorkspaceApi, WorkspaceClient,
    WorkspaceDetails, WorkspaceError,
};
pub use config::{
    ConfigError, ExecutionConfig, InputValue, Inputs, ServiceLogs, StageConfig,
    StorageCredentials,
};
pub use handler::{ExecutionHandler, ExecutionOutcome, HookError, ProxyGuard, StageHandler};
pub use runner::{
    NoopStatusReporter, OutputSlot, Outputs, Runner, RunnerError, ServiceStatus, StatusReporter,
    WorkflowExecutor,
};
pub use stac::{consolidate, Consolidated, StacError};
pub use storage::{S3StorageIo, StorageError, StorageIo};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{ConfigMapSource, KubeConfigMaps, WorkspaceApi, WorkspaceClient};
    pub use crate::config::{ExecutionConfig, Inputs, StageConfig, StorageCredentials};
    pub use crate::handler::{ExecutionHandler, ExecutionOutcome, StageHandler};
    pub use crate::runner::{Outputs, Runner, ServiceStatus, StatusReporter, WorkflowExecutor};
    pub use crate::stac::{consolidate, Consolidated};
    pub use crate::storage::{S3StorageIo, StorageIo};
}
