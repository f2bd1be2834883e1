//! Typed execution configuration
//!
//! This module contains:
//! - `context` - The per-run execution configuration validated at the host boundary
//! - `stage` - Storage credentials and stage-in/stage-out defaults

pub mod context;
pub mod stage;

pub use context::{
    AuthConfig, ExecutionConfig, InputValue, Inputs, Lenv, LogLink, MainConfig, PlatformConfig,
    ServiceLogs,
};
pub use stage::{StageConfig, StorageCredentials};

/// Errors raised while validating the host-provided configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
