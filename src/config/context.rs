//! Per-run execution configuration
//!
//! The WPS host hands every execution a nested string mapping. Everything
//! this crate reads or writes is validated once at that boundary into
//! [`ExecutionConfig`]; downstream code only ever sees named, typed fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::stage::StageConfig;
use super::ConfigError;

/// Host `main` section: where temporary artifacts live and how they are served
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainConfig {
    #[serde(rename = "tmpUrl", default)]
    pub tmp_url: String,

    #[serde(rename = "tmpPath", default)]
    pub tmp_path: String,
}

/// Host `lenv` section: the identity of the current execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lenv {
    /// Process identifier as declared to the host
    #[serde(rename = "Identifier", default)]
    pub identifier: String,

    /// Unique service id for this run
    #[serde(default)]
    pub usid: String,

    /// Failure message surfaced to the host on error
    #[serde(default)]
    pub message: Option<String>,
}

/// Host `auth_env` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Short-lived bearer token forwarded by the host
    #[serde(default)]
    pub jwt: String,
}

/// Platform conventions (host `eoepca` section)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub workspace_url: String,

    #[serde(default)]
    pub workspace_prefix: String,
}

impl PlatformConfig {
    /// Workspace lookup is only attempted when both the URL and prefix are set
    pub fn workspace_configured(&self) -> bool {
        !self.workspace_url.is_empty() && !self.workspace_prefix.is_empty()
    }
}

/// A single tool-log link reported back to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLink {
    pub url: String,
    pub title: String,
    pub rel: String,
}

/// Tool-log links collected after execution
///
/// The host protocol wants a flat map with positional key suffixes
/// (`url`, `title`, `rel`, then `url_1`, `title_1`, ...) plus a `length`
/// entry; the typed list is flattened only at that boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceLogs {
    pub entries: Vec<LogLink>,
}

impl ServiceLogs {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into the host's suffixed key map
    pub fn to_host_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let suffix = if i == 0 {
                String::new()
            } else {
                format!("_{}", i)
            };
            map.insert(format!("url{}", suffix), entry.url.clone());
            map.insert(format!("title{}", suffix), entry.title.clone());
            map.insert(format!("rel{}", suffix), entry.rel.clone());
        }
        map.insert("length".to_string(), self.entries.len().to_string());
        map
    }
}

/// A declared input value as wrapped by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputValue {
    #[serde(default)]
    pub value: String,
}

/// Declared inputs, keyed by input name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inputs(pub HashMap<String, InputValue>);

impl Inputs {
    /// The workspace this run stages out to
    pub fn workspace(&self) -> String {
        self.0
            .get("workspace")
            .map(|v| v.value.clone())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.value.as_str())
    }
}

/// The full per-run configuration
///
/// Built once from the host mapping via [`ExecutionConfig::from_value`];
/// the hooks mutate `stage` and `service_logs` in place over the course of
/// a single, strictly sequential run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub main: MainConfig,

    #[serde(default)]
    pub lenv: Lenv,

    #[serde(rename = "auth_env", default)]
    pub auth: AuthConfig,

    #[serde(rename = "eoepca", default)]
    pub platform: PlatformConfig,

    /// Environment variables forwarded to workflow pods
    #[serde(default)]
    pub pod_env_vars: HashMap<String, String>,

    /// Node selector forwarded to workflow pods
    #[serde(default)]
    pub pod_node_selector: HashMap<String, String>,

    /// Resolved staging configuration (not host-provided; filled from the
    /// environment defaults and the pre-execution hook)
    #[serde(skip)]
    pub stage: StageConfig,

    /// Tool-log links reported back to the host after execution
    #[serde(skip)]
    pub service_logs: ServiceLogs,
}

impl ExecutionConfig {
    /// Validate the host's nested mapping into a typed configuration.
    ///
    /// Stage defaults are resolved from the process environment here, once,
    /// so no later stage re-reads ambient state.
    pub fn from_value(conf: Value) -> Result<Self, ConfigError> {
        let mut config: ExecutionConfig = serde_json::from_value(conf)?;
        config.stage = StageConfig::from_env();
        Ok(config)
    }

    /// Load a configuration from a YAML file (standalone/CLI use)
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_yaml::from_str(&content)?;
        Self::from_value(value)
    }
}
