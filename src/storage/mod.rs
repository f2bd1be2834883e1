//! Object storage access
//!
//! This module contains:
//! - `StorageIo` - the read/write seam the catalog walker is given
//! - `s3` - path-style S3 implementation with SigV4 signing
//! - `sigv4` - request signing

use async_trait::async_trait;

pub mod s3;
pub mod sigv4;

pub use s3::{S3Location, S3StorageIo};

/// Errors raised by storage reads and writes
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage URI: {0}")]
    InvalidUri(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage returned status {status} for {uri}")]
    Status { status: u16, uri: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-level storage reader/writer
///
/// The post-execution hook builds one of these from the credentials it
/// resolved and passes it down explicitly; nothing in the crate reads
/// storage settings from ambient process state.
#[async_trait]
pub trait StorageIo: Send + Sync {
    async fn read_text(&self, uri: &str) -> Result<String, StorageError>;

    async fn write_text(&self, uri: &str, body: &str) -> Result<(), StorageError>;
}

/// Prefix a catalog location with `s3://` when it carries no scheme yet
pub fn ensure_s3_scheme(location: &str) -> String {
    if location.starts_with("s3://") {
        location.to_string()
    } else {
        format!("s3://{}", location)
    }
}
