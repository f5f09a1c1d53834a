//! # Invocation File Parsing
//!
//! This module parses `.treegen.yaml`, the file that lists the generation
//! steps one `treegen run` executes, in order.
//!
//! ## Formats
//!
//! The parser accepts two equivalent spellings of each list entry:
//!
//! 1.  **Explicit Format**: a mapping with a `generator` key and an optional
//!     `options` mapping. This is the recommended format.
//!
//!     ```yaml
//!     - generator: plugin
//!       options:
//!         name: my-plugin
//!     ```
//!
//! 2.  **Shorthand Format**: a single-key mapping from the generator name to
//!     its options.
//!
//!     ```yaml
//!     - executor: { project: my-plugin, name: echo }
//!     ```
//!
//! The parser first tries the explicit format for the whole document and falls
//! back to entry-by-entry parsing, so both spellings can be mixed.

use crate::error::{Error, Result};
use crate::phases::StepInvocation;
use serde_json::{Map, Value};
use std::path::Path;

/// Default invocation file name, looked up in the workspace root.
pub const DEFAULT_CONFIG_FILE: &str = ".treegen.yaml";

/// An invocation file: step invocations in execution order.
pub type Schema = Vec<StepInvocation>;

/// Parse the contents of an invocation file.
pub fn parse(yaml_content: &str) -> Result<Schema> {
    match serde_yaml::from_str::<Schema>(yaml_content) {
        Ok(schema) => Ok(schema),
        Err(_) => parse_entries(yaml_content),
    }
}

/// Parse entry by entry, accepting both the explicit and shorthand formats.
fn parse_entries(yaml_content: &str) -> Result<Schema> {
    use serde_yaml::Value as Yaml;

    let document: Yaml = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: format!("Invalid YAML: {}", e),
        hint: Some("Check indentation and quoting around the reported line".to_string()),
    })?;

    let entries = match document {
        Yaml::Null => return Ok(Vec::new()),
        Yaml::Sequence(entries) => entries,
        _ => {
            return Err(Error::ConfigParse {
                message: "Expected a list of step invocations".to_string(),
                hint: Some("Start each step with '- generator: <name>'".to_string()),
            })
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Yaml::Mapping(map) => convert_mapping(index, map),
            _ => Err(Error::ConfigParse {
                message: format!("Step {} is not a mapping", index + 1),
                hint: Some("Use '- generator: <name>' with an 'options' mapping".to_string()),
            }),
        })
        .collect()
}

fn convert_mapping(index: usize, map: serde_yaml::Mapping) -> Result<StepInvocation> {
    if map.contains_key("generator") {
        let value = to_json(index, serde_yaml::Value::Mapping(map))?;
        return serde_json::from_value(value).map_err(|e| Error::ConfigParse {
            message: format!("Step {}: {}", index + 1, e),
            hint: Some("Only 'generator' and 'options' are allowed in a step".to_string()),
        });
    }

    if map.len() != 1 {
        return Err(Error::ConfigParse {
            message: format!("Step {} names {} generators", index + 1, map.len()),
            hint: Some("Write one step per list entry".to_string()),
        });
    }

    let mut iter = map.into_iter();
    let (key, options) = iter.next().ok_or_else(|| Error::ConfigParse {
        message: format!("Step {} is empty", index + 1),
        hint: None,
    })?;
    let generator = key.as_str().ok_or_else(|| Error::ConfigParse {
        message: format!("Step {}: generator name must be a string", index + 1),
        hint: None,
    })?;

    let options = match to_json(index, options)? {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    Ok(StepInvocation::new(generator, options))
}

fn to_json(index: usize, value: serde_yaml::Value) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::ConfigParse {
        message: format!("Step {}: {}", index + 1, e),
        hint: Some("Option keys must be strings".to_string()),
    })
}

/// Parse an invocation file from disk.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Schema> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
