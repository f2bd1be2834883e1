//! Link-following catalog traversal
//!
//! Catalogs reference their collections and items through relative links;
//! the walker reads them through an injected [`StorageIo`] and resolves
//! hrefs against the location each object was read from.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::warn;

use super::types::{links_of, object_kind, Item};
use super::StacError;
use crate::storage::StorageIo;

/// Read and parse one STAC object
pub async fn read_object(io: &dyn StorageIo, uri: &str) -> Result<Value, StacError> {
    let text = io.read_text(uri).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Resolve a link href against the URI its object was read from
pub fn join_href(base: &str, href: &str) -> String {
    if href.contains("://") || href.starts_with('/') {
        return href.to_string();
    }

    let parent = match base.rfind('/') {
        Some(idx) => &base[..idx],
        None => base,
    };

    let mut segments: Vec<&str> = parent.split('/').collect();
    for segment in href.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                if segments.len() > 3 {
                    // keep at least "s3:", "", "bucket"
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// An object's self link, falling back to the location it was read from
pub fn self_href(value: &Value, read_from: &str) -> Option<String> {
    links_of(value)
        .into_iter()
        .find(|link| link.rel == "self")
        .map(|link| join_href(read_from, &link.href))
        .or_else(|| {
            if read_from.is_empty() {
                None
            } else {
                Some(read_from.to_string())
            }
        })
}

/// The first collection declared anywhere under the catalog, breadth-first,
/// returned as the raw object plus the URI it was read from.
///
/// Unreadable or malformed children are logged and skipped; they never abort
/// the walk.
pub async fn first_collection(
    io: &dyn StorageIo,
    root: &Value,
    root_uri: &str,
) -> Option<(Value, String)> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Value, String)> = VecDeque::new();
    queue.push_back((root.clone(), root_uri.to_string()));

    while let Some((object, uri)) = queue.pop_front() {
        for link in links_of(&object) {
            if link.rel != "child" {
                continue;
            }
            let child_uri = join_href(&uri, &link.href);
            if !visited.insert(child_uri.clone()) {
                continue;
            }
            match read_object(io, &child_uri).await {
                Ok(child) => match object_kind(&child) {
                    Some("Collection") => return Some((child, child_uri)),
                    Some("Catalog") => queue.push_back((child, child_uri)),
                    other => {
                        warn!("Skipping child {} with type {:?}", child_uri, other);
                    }
                },
                Err(e) => {
                    warn!("Skipping unreadable child {}: {}", child_uri, e);
                }
            }
        }
    }
    None
}

/// Every item reachable from the catalog, breadth-first through child
/// catalogs and collections. Unreadable entries are logged and skipped.
pub async fn all_items(io: &dyn StorageIo, root: &Value, root_uri: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Value, String)> = VecDeque::new();
    queue.push_back((root.clone(), root_uri.to_string()));

    while let Some((object, uri)) = queue.pop_front() {
        for link in links_of(&object) {
            let target_uri = join_href(&uri, &link.href);
            match link.rel.as_str() {
                "item" => {
                    if !visited.insert(target_uri.clone()) {
                        continue;
                    }
                    match read_object(io, &target_uri).await {
                        Ok(raw) => match serde_json::from_value::<Item>(raw) {
                            Ok(item) => items.push(item),
                            Err(e) => warn!("Skipping malformed item {}: {}", target_uri, e),
                        },
                        Err(e) => warn!("Skipping unreadable item {}: {}", target_uri, e),
                    }
                }
                "child" => {
                    if !visited.insert(target_uri.clone()) {
                        continue;
                    }
                    match read_object(io, &target_uri).await {
                        Ok(child) => queue.push_back((child, target_uri)),
                        Err(e) => warn!("Skipping unreadable child {}: {}", target_uri, e),
                    }
                }
                _ => {}
            }
        }
    }
    items
}
