//! STAC object shapes
//!
//! Only the fields this crate interprets are named; everything else passes
//! through untouched via `#[serde(flatten)]` so re-serialized objects keep
//! whatever the workflow wrote.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A STAC link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A STAC asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A STAC item (GeoJSON Feature)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,

    pub id: String,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// The `type` discriminator of a raw STAC object, if it has one
pub fn object_kind(value: &Value) -> Option<&str> {
    value.get("type").and_then(|v| v.as_str())
}

/// The links array of a raw STAC object
pub fn links_of(value: &Value) -> Vec<Link> {
    value
        .get("links")
        .and_then(|v| v.as_array())
        .map(|links| {
            links
                .iter()
                .filter_map(|link| serde_json::from_value(link.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
