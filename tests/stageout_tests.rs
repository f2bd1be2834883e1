//! End-to-end runner tests: hooks, consolidation, and output hand-off
//! driven through the public API with fake engine and workspace backends.

mod common;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use common::{stac_item, FakeWorkspace, MemoryIo};
use eo_stageout::config::{ExecutionConfig, Inputs};
use eo_stageout::handler::{ExecutionHandler, ExecutionOutcome, StageHandler};
use eo_stageout::runner::{Outputs, Runner, RunnerError, ServiceStatus, WorkflowExecutor};

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

fn cwl() -> serde_yaml::Value {
    serde_yaml::from_str("cwlVersion: v1.0\nclass: Workflow\n").unwrap()
}

fn catalog_io() -> Arc<MemoryIo> {
    Arc::new(MemoryIo::from_entries(&[
        (
            "s3://results/run-42/catalog.json",
            json!({
                "type": "Catalog",
                "id": "root",
                "links": [
                    {"rel": "self", "href": "s3://results/run-42/catalog.json"},
                    {"rel": "item", "href": "item-1/item-1.json"}
                ]
            }),
        ),
        ("s3://results/run-42/item-1/item-1.json", stac_item("item-1")),
    ]))
}

fn successful_outcome() -> ExecutionOutcome {
    ExecutionOutcome {
        success: true,
        output: HashMap::from([(
            "StacCatalogUri".to_string(),
            "results/run-42/catalog.json".to_string(),
        )]),
        tool_logs: vec!["/tmp/logs/node_stage_out.log".to_string()],
        ..Default::default()
    }
}

fn declared_outputs() -> Outputs {
    Outputs::from_names(&["stac"])
}

#[tokio::test]
async fn test_full_run_registers_and_fills_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::workspace_config(dir.path().to_str().unwrap(), "alice");
    let workspace = Arc::new(FakeWorkspace::new());

    let mut handler = StageHandler::new(config, &Inputs::default(), Some(workspace.clone()), None)
        .with_storage_io(catalog_io());

    let runner = Runner::new(
        cwl(),
        Arc::new(FakeExecutor {
            outcome: successful_outcome(),
        }),
    );
    let mut outputs = declared_outputs();
    let status = runner
        .execute(&mut handler, &Inputs::default(), &mut outputs)
        .await;

    assert_eq!(status, ServiceStatus::Succeeded);
    assert_eq!(status.code(), 3);

    // the first declared output carries the consolidated collection
    let collection: serde_json::Value = serde_json::from_str(outputs.get("stac").unwrap()).unwrap();
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["id"], "run-42");
    let asset = &collection["features"][0]["assets"]["data"];
    assert_eq!(asset["storage:platform"], "EOEPCA");
    assert_eq!(asset["storage:region"], "eu-west-1");
    assert_eq!(asset["storage:endpoint"], "https://minio.demo");

    // registration went to the prefix-username workspace
    let registered = workspace.collections.lock().unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].0, "ws-alice");
    let results = workspace.results.lock().unwrap();
    assert_eq!(results[0].1, "s3://results/run-42/catalog.json");

    // tool logs flattened into the host map
    let map = handler.config().service_logs.to_host_map();
    assert_eq!(
        map.get("url").unwrap(),
        "http://host/tmp/water-bodies-run-42/node_stage_out.log"
    );
    assert_eq!(map.get("length").unwrap(), "1");
}

#[tokio::test]
async fn test_empty_catalog_succeeds_without_registration() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::workspace_config(dir.path().to_str().unwrap(), "alice");
    let workspace = Arc::new(FakeWorkspace::new());

    let io = Arc::new(MemoryIo::from_entries(&[(
        "s3://results/run-42/catalog.json",
        json!({"type": "Catalog", "id": "root", "links": []}),
    )]));
    let mut handler = StageHandler::new(config, &Inputs::default(), Some(workspace.clone()), None)
        .with_storage_io(io);

    let runner = Runner::new(
        cwl(),
        Arc::new(FakeExecutor {
            outcome: successful_outcome(),
        }),
    );
    let mut outputs = declared_outputs();
    let status = runner
        .execute(&mut handler, &Inputs::default(), &mut outputs)
        .await;

    assert_eq!(status, ServiceStatus::Succeeded);
    assert_eq!(outputs.get("stac"), Some("{}"));
    assert!(workspace.collections.lock().unwrap().is_empty());
    assert!(workspace.results.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_catalog_output_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::workspace_config(dir.path().to_str().unwrap(), "alice");

    let mut handler = StageHandler::new(config, &Inputs::default(), None, None)
        .with_storage_io(catalog_io());

    let outcome = ExecutionOutcome {
        success: true,
        ..Default::default()
    };
    let runner = Runner::new(cwl(), Arc::new(FakeExecutor { outcome }));
    let mut outputs = declared_outputs();
    let status = runner
        .execute(&mut handler, &Inputs::default(), &mut outputs)
        .await;

    assert_eq!(status, ServiceStatus::Failed);
    assert_eq!(status.code(), 4);
    let message = handler.config().lenv.message.clone().unwrap();
    assert!(message.contains("StacCatalogUri"));
    assert!(outputs.get("stac").is_none());
}

#[tokio::test]
async fn test_failed_engine_reports_failure_with_logs() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::workspace_config(dir.path().to_str().unwrap(), "alice");

    let mut handler = StageHandler::new(config, &Inputs::default(), None, None)
        .with_storage_io(catalog_io());

    let outcome = ExecutionOutcome {
        success: false,
        tool_logs: vec!["/tmp/logs/node_fail.log".to_string()],
        ..Default::default()
    };
    let runner = Runner::new(cwl(), Arc::new(FakeExecutor { outcome }));
    let mut outputs = declared_outputs();
    let status = runner
        .execute(&mut handler, &Inputs::default(), &mut outputs)
        .await;

    assert_eq!(status, ServiceStatus::Failed);
    assert_eq!(
        handler.config().lenv.message.as_deref(),
        Some("Execution failed")
    );
    // logs are propagated even on failure
    assert_eq!(
        handler.config().service_logs.to_host_map().get("length").unwrap(),
        "1"
    );
}

#[tokio::test]
async fn test_workspace_input_picks_the_target_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::workspace_config(dir.path().to_str().unwrap(), "alice");
    let workspace = Arc::new(FakeWorkspace::new());

    let inputs: Inputs =
        serde_json::from_value(json!({"workspace": {"value": "shared-project"}})).unwrap();
    let handler = StageHandler::new(config, &inputs, Some(workspace), None);

    assert_eq!(handler.workspace_name(), "shared-project");
}
