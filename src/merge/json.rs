//! JSON document operations
//!
//! Read-modify-write helpers for JSON documents living in the staged tree.
//! Documents are parsed into `serde_json::Value` (with key insertion order
//! preserved), transformed, and written back pretty-printed with a trailing
//! newline.
//!
//! ## Features
//!
//! - Typed and untyped reads
//! - Updaters that see every earlier write to the same path
//! - `create_json_if_absent` for idempotent seeding
//! - Deep merging of a fragment at a structured path
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use treegen::filesystem::MemoryFS;
//! use treegen::merge::json::{read_json, update_json_or};
//! use treegen::tree::Tree;
//!
//! let mut store = MemoryFS::new();
//! let mut tree = Tree::new(&mut store);
//! update_json_or(&mut tree, "generators.json", json!({"generators": {}}), |mut doc| {
//!     doc["generators"]["my-generator"] = json!({"factory": "./gen"});
//!     Ok(doc)
//! })
//! .unwrap();
//! assert_eq!(read_json(&tree, "generators.json").unwrap()["generators"].as_object().unwrap().len(), 1);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{parse_path, PathSegment};
use crate::error::{Error, Result};
use crate::tree::Tree;

/// Navigate to a specific path within a JSON value, creating intermediate
/// structures as needed.
///
/// Supports both object and array navigation. For objects, uses string keys;
/// for arrays, uses numeric indices. Creates missing intermediate structures
/// automatically.
///
/// # Errors
///
/// Returns `Error::Merge` if the path cannot be navigated due to type mismatches.
pub fn navigate_json_value<'a>(
    value: &'a mut JsonValue,
    path: &[PathSegment],
) -> Result<&'a mut JsonValue> {
    let mut current = value;
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if current.is_null() {
                    *current = JsonValue::Object(serde_json::Map::new());
                }

                let Some(map) = current.as_object_mut() else {
                    return Err(Error::Merge {
                        operation: "json navigate".to_string(),
                        message: format!("Expected object while navigating to '{}'", key),
                    });
                };
                current = map
                    .entry(key.clone())
                    .or_insert(JsonValue::Object(serde_json::Map::new()));
            }
            PathSegment::Index(idx) => {
                if current.is_null() {
                    *current = JsonValue::Array(Vec::new());
                }

                let Some(array) = current.as_array_mut() else {
                    return Err(Error::Merge {
                        operation: "json navigate".to_string(),
                        message: format!("Expected array while navigating to index {}", idx),
                    });
                };
                while array.len() <= *idx {
                    array.push(JsonValue::Null);
                }
                current = &mut array[*idx];
            }
        }
    }

    Ok(current)
}

/// Recursively merge source JSON value into target
///
/// Handles different JSON types appropriately:
/// - Objects: Recursively merge keys, with source values taking precedence for conflicts;
///   keys only in the target are left alone
/// - Arrays: Either append source items to target or replace entirely
/// - Scalars: Replace target with source
pub fn merge_json_values(target: &mut JsonValue, source: &JsonValue, append: bool) {
    match (target, source) {
        (JsonValue::Object(target_map), JsonValue::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json_values(existing, value, append);
                    }
                    Some(existing) if existing.is_array() && value.is_array() => {
                        merge_json_values(existing, value, append);
                    }
                    Some(existing) => *existing = value.clone(),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (JsonValue::Array(target_array), JsonValue::Array(source_array)) if append => {
            target_array.extend(source_array.iter().cloned());
        }
        (target, source) => *target = source.clone(),
    }
}

/// Read and parse a JSON document.
///
/// # Errors
///
/// `Error::NotFound` when the file does not exist, `Error::Parse` when it is
/// not well-formed JSON.
pub fn read_json(tree: &Tree<'_>, path: &str) -> Result<JsonValue> {
    let content = tree.read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| Error::Parse {
        path: path.to_string(),
        message: err.to_string(),
    })
}

/// Read a JSON document into a typed structure.
pub fn read_json_as<T: DeserializeOwned>(tree: &Tree<'_>, path: &str) -> Result<T> {
    let value = read_json(tree, path)?;
    serde_json::from_value(value).map_err(|err| Error::Parse {
        path: path.to_string(),
        message: err.to_string(),
    })
}

/// Serialize `value` and write it to `path`, replacing any existing content.
pub fn write_json<T: Serialize + ?Sized>(tree: &mut Tree<'_>, path: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value).map_err(|err| Error::Serialization {
        message: format!("Failed to serialize {}: {}", path, err),
    })?;
    tree.write(path, ensure_trailing_newline(serialized))
}

/// Apply `updater` to an existing JSON document and write the result back.
///
/// Fails with `Error::NotFound` when the document does not exist.
pub fn update_json<F>(tree: &mut Tree<'_>, path: &str, updater: F) -> Result<()>
where
    F: FnOnce(JsonValue) -> Result<JsonValue>,
{
    let current = read_json(tree, path)?;
    let updated = updater(current)?;
    write_json(tree, path, &updated)
}

/// Like [`update_json`], but starts from `default` when the document is absent.
pub fn update_json_or<F>(
    tree: &mut Tree<'_>,
    path: &str,
    default: JsonValue,
    updater: F,
) -> Result<()>
where
    F: FnOnce(JsonValue) -> Result<JsonValue>,
{
    let current = if tree.is_file(path) {
        read_json(tree, path)?
    } else {
        default
    };
    let updated = updater(current)?;
    write_json(tree, path, &updated)
}

/// Typed read-modify-write of an existing document.
pub fn update_json_as<T, F>(tree: &mut Tree<'_>, path: &str, updater: F) -> Result<()>
where
    T: DeserializeOwned + Serialize,
    F: FnOnce(&mut T) -> Result<()>,
{
    let mut value: T = read_json_as(tree, path)?;
    updater(&mut value)?;
    write_json(tree, path, &value)
}

/// Write `value` only when nothing exists at `path`.
///
/// Returns whether the document was written. Calling this again with the
/// same arguments never resets or duplicates the document.
pub fn create_json_if_absent<T: Serialize + ?Sized>(
    tree: &mut Tree<'_>,
    path: &str,
    value: &T,
) -> Result<bool> {
    if tree.exists(path) {
        return Ok(false);
    }
    write_json(tree, path, value)?;
    Ok(true)
}

/// Deep-merge `fragment` into the document at the structured path `at`.
///
/// A missing document starts out as `{}`. Arrays are appended to when
/// `append` is set and replaced otherwise.
pub fn merge_json_at(
    tree: &mut Tree<'_>,
    path: &str,
    at: &str,
    fragment: &JsonValue,
    append: bool,
) -> Result<()> {
    let segments = parse_path(at);
    update_json_or(
        tree,
        path,
        JsonValue::Object(serde_json::Map::new()),
        |mut document| {
            let target = navigate_json_value(&mut document, &segments)?;
            merge_json_values(target, fragment, append);
            Ok(document)
        },
    )
}

fn ensure_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}
