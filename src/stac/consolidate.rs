//! Output-collection consolidation
//!
//! After a workflow run finishes, its declared output catalog is normalized
//! into exactly one collection object: either the catalog's first declared
//! collection taken as-is, or a FeatureCollection synthesized from every
//! item with storage metadata stamped onto each asset. When the catalog
//! yields neither, the result is an explicit [`Consolidated::Empty`] -
//! downstream consumers see an empty structure, never a missing one.

use serde_json::{json, Value};
use tracing::{error, info};

use super::types::Item;
use super::walk::{all_items, first_collection, read_object, self_href};
use crate::config::StorageCredentials;
use crate::storage::{ensure_s3_scheme, StorageIo};

/// Storage platform tag stamped onto synthesized assets
const STORAGE_PLATFORM: &str = "EOEPCA";
const STORAGE_TIER: &str = "Standard";

/// The single consolidated output of a run
#[derive(Debug, Clone)]
pub enum Consolidated {
    /// One collection, with the link used for result registration
    Collection {
        body: Value,
        self_href: Option<String>,
    },

    /// The catalog produced neither a collection nor any items
    Empty,
}

impl Consolidated {
    pub fn is_empty(&self) -> bool {
        matches!(self, Consolidated::Empty)
    }

    /// The artifact handed back to the host: the collection body, or `{}`
    pub fn to_json_string(&self) -> String {
        match self {
            Consolidated::Collection { body, .. } => {
                serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string())
            }
            Consolidated::Empty => "{}".to_string(),
        }
    }
}

/// Consolidate a run's output catalog into one collection.
///
/// The supplied `collection_id` always overwrites whatever id the catalog
/// carried. Read failures collapse the affected branch to "absent" and are
/// logged; this function never fails.
pub async fn consolidate(
    io: &dyn StorageIo,
    catalog_location: &str,
    collection_id: &str,
    credentials: &StorageCredentials,
) -> Consolidated {
    let catalog_uri = ensure_s3_scheme(catalog_location);
    info!("Read catalog => STAC Catalog URI: {}", catalog_uri);

    let catalog = match read_object(io, &catalog_uri).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to read output catalog {}: {}", catalog_uri, e);
            return Consolidated::Empty;
        }
    };

    info!("Create collection with ID {}", collection_id);

    if let Some((mut collection, read_from)) = first_collection(io, &catalog, &catalog_uri).await {
        info!("Got collection from outputs");
        let href = self_href(&collection, &read_from);
        if let Some(object) = collection.as_object_mut() {
            object.insert("id".to_string(), json!(collection_id));
        }
        return Consolidated::Collection {
            body: collection,
            self_href: href,
        };
    }

    let items = all_items(io, &catalog, &catalog_uri).await;
    if items.is_empty() {
        error!("The output collection is empty");
        return Consolidated::Empty;
    }

    info!("Created collection from {} items", items.len());
    let features: Vec<Value> = items
        .into_iter()
        .map(|item| annotate_item(item, collection_id, credentials))
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();

    let body = json!({
        "type": "FeatureCollection",
        "features": features,
        "id": collection_id,
    });

    // A synthesized collection has no self link of its own; the catalog's
    // self pointer is the closest thing a registration can reference.
    let href = self_href(&catalog, &catalog_uri);

    Consolidated::Collection {
        body,
        self_href: href,
    }
}

/// Stamp storage metadata onto every asset and reassign the collection id
fn annotate_item(mut item: Item, collection_id: &str, credentials: &StorageCredentials) -> Item {
    for asset in item.assets.values_mut() {
        asset
            .extra
            .insert("storage:platform".to_string(), json!(STORAGE_PLATFORM));
        asset
            .extra
            .insert("storage:requester_pays".to_string(), json!(false));
        asset
            .extra
            .insert("storage:tier".to_string(), json!(STORAGE_TIER));
        asset
            .extra
            .insert("storage:region".to_string(), json!(credentials.region));
        asset
            .extra
            .insert("storage:endpoint".to_string(), json!(credentials.endpoint));
    }
    item.collection = Some(collection_id.to_string());
    item
}
