//! Shared test fixtures

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::storage::{StorageError, StorageIo};

/// In-memory storage for exercising catalog reads without a network
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
