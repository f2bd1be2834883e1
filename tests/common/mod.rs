//! Shared fixtures for integration tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use eo_stageout::client::workspace::WorkspaceStorage;
use eo_stageout::client::{WorkspaceApi, WorkspaceCredentials, WorkspaceDetails, WorkspaceError};
use eo_stageout::config::ExecutionConfig;
use eo_stageout::storage::{StorageError, StorageIo};

/// In-memory storage backend; misses read as 404s
pub struct MemoryIo {
    objects: HashMap<String, String>,
}

impl MemoryIo {
    pub fn from_entries(entries: &[(&str, Value)]) -> Self {
        Self {
            objects: entries
                .iter()
                .map(|(uri, value)| (uri.to_string(), value.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl StorageIo for MemoryIo {
    async fn read_text(&self, uri: &str) -> Result<String, StorageError> {
        self.objects
            .get(uri)
            .cloned()
            .ok_or_else(|| StorageError::Status {
                status: 404,
                uri: uri.to_string(),
            })
    }

    async fn write_text(&self, _uri: &str, _body: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Workspace API fake that records every registration call
pub struct FakeWorkspace {
    pub collections: Mutex<Vec<(String, Value)>>,
    pub results: Mutex<Vec<(String, String)>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WorkspaceApi for FakeWorkspace {
    async fn workspace_details(&self, _workspace: &str) -> Result<WorkspaceDetails, WorkspaceError> {
        Ok(WorkspaceDetails {
            storage: WorkspaceStorage {
                credentials: WorkspaceCredentials {
                    endpoint: "https://minio.demo".to_string(),
                    access: "ws-access".to_string(),
                    secret: "ws-secret".to_string(),
                    region: "eu-west-1".to_string(),
                    bucketname: "ws-alice".to_string(),
                },
            },
        })
    }

    async fn register_collection(
        &self,
        workspace: &str,
        collection: &Value,
    ) -> Result<u16, WorkspaceError> {
        self.collections
            .lock()
            .unwrap()
            .push((workspace.to_string(), collection.clone()));
        Ok(200)
    }

    async fn register_result(&self, workspace: &str, url: &str) -> Result<u16, WorkspaceError> {
        self.results
            .lock()
            .unwrap()
            .push((workspace.to_string(), url.to_string()));
        Ok(200)
    }
}

/// Unsigned bearer token carrying the given username claim
pub fn make_token(username: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"preferred_username": username}).to_string());
    format!("{}.{}.sig", header, payload)
}

/// A host configuration with workspace lookup enabled
pub fn workspace_config(tmp_path: &str, username: &str) -> ExecutionConfig {
    ExecutionConfig::from_value(json!({
        "main": {"tmpUrl": "http://host/tmp", "tmpPath": tmp_path},
        "lenv": {"Identifier": "water-bodies", "usid": "run-42"},
        "auth_env": {"jwt": make_token(username)},
        "eoepca": {
            "domain": "demo.eoepca.org",
            "workspace_url": "https://workspace-api.demo",
            "workspace_prefix": "ws"
        }
    }))
    .unwrap()
}

/// A STAC item fixture with one data asset
pub fn stac_item(id: &str) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "geometry": null,
        "properties": {"datetime": "2024-01-01T00:00:00Z"},
        "assets": {
            "data": {"href": format!("s3://results/run-42/{}/data.tif", id)}
        },
        "links": []
    })
}
