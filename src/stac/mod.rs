//! Minimal STAC data model and output consolidation
//!
//! This module contains:
//! - `types` - catalog/collection/item/asset shapes with lossless passthrough
//! - `walk` - link-following catalog traversal over a storage reader
//! - `consolidate` - the output-collection consolidation pipeline

pub mod consolidate;
pub mod types;
pub mod walk;

pub use consolidate::{consolidate, Consolidated};
pub use types::{Asset, Item, Link};
pub use walk::{all_items, first_collection, join_href, read_object, self_href};

use crate::storage::StorageError;

/// Errors raised while reading catalog objects
#[derive(Debug, thiserror::Error)]
pub enum StacError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid STAC object: {0}")]
    Json(#[from] serde_json::Error),
}
