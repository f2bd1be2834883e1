//! Clients for external platform services
//!
//! This module contains:
//! - `workspace` - the workspace REST API (credential lookup, registration)
//! - `cluster` - the cluster ConfigMap lookup for the stage-out access point

pub mod cluster;
pub mod workspace;

pub use cluster::{ClusterError, ConfigMapSource, KubeConfigMaps};
pub use workspace::{
    WorkspaceApi, WorkspaceClient, WorkspaceCredentials, WorkspaceDetails, WorkspaceError,
    WorkspaceStorage,
};
