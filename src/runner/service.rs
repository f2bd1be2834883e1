//! Execution runner
//!
//! Wires one run end to end: working directory, pre-hook, engine, post-hook,
//! service logs, and the hand-off of the consolidated collection into the
//! host's first declared output slot.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{NoopStatusReporter, RunnerError, ServiceStatus, StatusReporter, WorkflowExecutor};
use crate::config::Inputs;
use crate::handler::{ExecutionHandler, StageHandler};

/// A declared output slot, filled with the serialized collection on success
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSlot {
    #[serde(default)]
    pub value: Option<String>,
}

/// Declared outputs, in host declaration order
///
/// "The first output" means the first one the host declared, so the slots
/// keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct Outputs(pub Vec<(String, OutputSlot)>);

impl Outputs {
    pub fn from_names(names: &[&str]) -> Self {
        Self(
            names
                .iter()
                .map(|name| (name.to_string(), OutputSlot::default()))
                .collect(),
        )
    }

    /// Set the first declared output; returns the slot name that was filled
    pub fn set_first(&mut self, value: &str) -> Option<String> {
        let (name, slot) = self.0.first_mut()?;
        slot.value = Some(value.to_string());
        Some(name.clone())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(slot_name, _)| slot_name == name)
            .and_then(|(_, slot)| slot.value.as_deref())
    }
}

/// Drives one workflow execution through an injected engine
pub struct Runner {
    cwl: serde_yaml::Value,
    executor: Arc<dyn WorkflowExecutor>,
    reporter: Arc<dyn StatusReporter>,
}

impl Runner {
    pub fn new(cwl: serde_yaml::Value, executor: Arc<dyn WorkflowExecutor>) -> Self {
        Self {
            cwl,
            executor,
            reporter: Arc::new(NoopStatusReporter),
        }
    }

    /// Load the CWL application package from a file
    pub fn from_cwl_file(
        path: impl AsRef<std::path::Path>,
        executor: Arc<dyn WorkflowExecutor>,
    ) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_yaml::from_str(&content)?, executor))
    }

    pub fn with_status_reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Execute the run; any error maps to a failure status with a message
    /// in the handler's `lenv` for the host to surface.
    pub async fn execute(
        &self,
        handler: &mut StageHandler,
        inputs: &Inputs,
        outputs: &mut Outputs,
    ) -> ServiceStatus {
        match self.run(handler, inputs, outputs).await {
            Ok(status) => status,
            Err(e) => {
                error!("Execution failed: {}", e);
                handler.set_failure_message(&format!("Exception during execution: {}", e));
                ServiceStatus::Failed
            }
        }
    }

    async fn run(
        &self,
        handler: &mut StageHandler,
        inputs: &Inputs,
        outputs: &mut Outputs,
    ) -> Result<ServiceStatus, RunnerError> {
        // outputs of this run live in a directory dedicated to it
        let working_dir = self.working_dir(handler, inputs);
        std::fs::create_dir_all(&working_dir)?;

        self.reporter.update_status(0, None);
        handler.pre_execution_hook().await?;

        let outcome = self
            .executor
            .execute(
                &self.cwl,
                handler.config(),
                inputs,
                &working_dir,
                handler as &dyn ExecutionHandler,
            )
            .await?;

        handler.handle_outputs(&outcome);

        if !outcome.success {
            handler.set_failure_message("Execution failed");
            self.reporter.update_status(100, Some("Execution failed"));
            return Ok(ServiceStatus::Failed);
        }

        handler.post_execution_hook(&outcome).await?;

        if let Some(collection) = handler.feature_collection() {
            if let Some(name) = outputs.set_first(collection) {
                info!("Setting collection into output key {}", name);
            }
        }

        self.reporter.update_status(100, None);
        Ok(ServiceStatus::Succeeded)
    }

    fn working_dir(&self, handler: &StageHandler, inputs: &Inputs) -> PathBuf {
        let namespace = format!("ws-{}", inputs.workspace());
        PathBuf::from(&handler.config().main.tmp_path).join(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::Path;

    use crate::config::ExecutionConfig;
    use crate::handler::ExecutionOutcome;
    use crate::test_support::MemoryIo;

    struct FakeExecutor {
        outcome: ExecutionOutcome,
    }

    #[async_trait]
    impl WorkflowExecutor for FakeExecutor {
        async fn execute(
            &self,
            _cwl: &serde_yaml::Value,
            _config: &ExecutionConfig,
            _inputs: &Inputs,
            working_dir: &Path,
            _handler: &dyn ExecutionHandler,
        ) -> Result<ExecutionOutcome, RunnerError> {
            assert!(working_dir.exists());
            Ok(self.outcome.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl WorkflowExecutor for FailingExecutor {
        async fn execute(
            &self,
            _cwl: &serde_yaml::Value,
            _config: &ExecutionConfig,
            _inputs: &Inputs,
            _working_dir: &Path,
            _handler: &dyn ExecutionHandler,
        ) -> Result<ExecutionOutcome, RunnerError> {
            Err(RunnerError::Engine("namespace creation failed".to_string()))
        }
    }

    fn make_handler(tmp_path: &Path) -> StageHandler {
        let config = ExecutionConfig::from_value(json!({
            "main": {"tmpUrl": "http://host/tmp", "tmpPath": tmp_path.to_str().unwrap()},
            "lenv": {"Identifier": "water-bodies", "usid": "run-42"}
        }))
        .unwrap();
        StageHandler::new(config, &Inputs::default(), None, None).with_storage_io(Arc::new(
            MemoryIo::from_entries(&[(
                "s3://results/run-42/catalog.json",
                json!({
                    "type": "Catalog",
                    "id": "root",
                    "links": [{"rel": "child", "href": "col/collection.json"}]
                }),
            ), (
                "s3://results/run-42/col/collection.json",
                json!({"type": "Collection", "id": "original", "links": []}),
            )]),
        ))
    }

    fn cwl() -> serde_yaml::Value {
        serde_yaml::from_str("cwlVersion: v1.0\nclass: Workflow\n").unwrap()
    }

    fn declared_outputs() -> Outputs {
        Outputs::from_names(&["stac"])
    }

    #[tokio::test]
    async fn test_successful_run_fills_first_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = make_handler(dir.path());

        let executor = FakeExecutor {
            outcome: ExecutionOutcome {
                success: true,
                output: HashMap::from([(
                    "StacCatalogUri".to_string(),
                    "results/run-42/catalog.json".to_string(),
                )]),
                tool_logs: vec!["/tmp/step-1.log".to_string()],
                ..Default::default()
            },
        };

        let runner = Runner::new(cwl(), Arc::new(executor));
        let mut outputs = declared_outputs();
        let status = runner
            .execute(&mut handler, &Inputs::default(), &mut outputs)
            .await;

        assert_eq!(status, ServiceStatus::Succeeded);
        let collection: serde_json::Value =
            serde_json::from_str(outputs.get("stac").unwrap()).unwrap();
        assert_eq!(collection["id"], "run-42");
        // tool logs propagated into the host map
        assert_eq!(
            handler.config().service_logs.to_host_map().get("length").unwrap(),
            "1"
        );
        // dedicated working directory created
        assert!(dir.path().join("ws-default").exists());
    }

    #[tokio::test]
    async fn test_engine_failure_sets_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = make_handler(dir.path());

        let executor = FakeExecutor {
            outcome: ExecutionOutcome {
                success: false,
                ..Default::default()
            },
        };

        let runner = Runner::new(cwl(), Arc::new(executor));
        let mut outputs = declared_outputs();
        let status = runner
            .execute(&mut handler, &Inputs::default(), &mut outputs)
            .await;

        assert_eq!(status, ServiceStatus::Failed);
        assert_eq!(
            handler.config().lenv.message.as_deref(),
            Some("Execution failed")
        );
        assert!(outputs.get("stac").is_none());
    }

    #[tokio::test]
    async fn test_engine_error_maps_to_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = make_handler(dir.path());

        let runner = Runner::new(cwl(), Arc::new(FailingExecutor));
        let mut outputs = declared_outputs();
        let status = runner
            .execute(&mut handler, &Inputs::default(), &mut outputs)
            .await;

        assert_eq!(status, ServiceStatus::Failed);
        let message = handler.config().lenv.message.clone().unwrap();
        assert!(message.contains("namespace creation failed"));
    }

    #[test]
    fn test_outputs_set_first_follows_declaration_order() {
        // declaration order wins over lexicographic order
        let mut outputs = Outputs::from_names(&["result_b", "result_a"]);

        assert_eq!(outputs.set_first("{}").as_deref(), Some("result_b"));
        assert_eq!(outputs.get("result_b"), Some("{}"));
        assert!(outputs.get("result_a").is_none());
    }

    #[test]
    fn test_outputs_set_first_empty() {
        let mut outputs = Outputs::default();
        assert!(outputs.set_first("{}").is_none());
    }
}
