//! Service entry glue
//!
//! This module contains:
//! - `status` - host status codes and the status-reporter capability
//! - `service` - the runner wiring hooks, engine, and host outputs together
//!
//! The workflow engine itself (scheduling, container runs, namespace
//! creation) is external; it plugs in through [`WorkflowExecutor`].

use std::path::Path;

use async_trait::async_trait;

use crate::config::{ExecutionConfig, Inputs};
use crate::handler::{ExecutionHandler, ExecutionOutcome, HookError};

pub mod service;
pub mod status;

pub use service::{OutputSlot, Outputs, Runner};
pub use status::{NoopStatusReporter, ServiceStatus, StatusReporter};

/// Errors raised while driving one execution
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CWL error: {0}")]
    Cwl(#[from] serde_yaml::Error),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// The external workflow execution engine seam
///
/// The engine receives the CWL document, the typed configuration, the run's
/// declared inputs, a dedicated working directory, and the handler it may
/// query for pod environment, node selector, secrets, and stage parameters.
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    async fn execute(
        &self,
        cwl: &serde_yaml::Value,
        config: &ExecutionConfig,
        inputs: &Inputs,
        working_dir: &Path,
        handler: &dyn ExecutionHandler,
    ) -> Result<ExecutionOutcome, RunnerError>;
}
