//! Formatting of changed files before the flush
//!
//! The orchestrator runs a [`Formatter`] once over every created or updated
//! file after the last step finished. Deleted files are never formatted.

use crate::error::{Error, Result};
use crate::tree::{ChangeKind, Tree};
use log::debug;

/// Rewrites file content into a canonical layout.
pub trait Formatter {
    /// Name shown in logs.
    fn name(&self) -> &'static str;

    /// Formatted content of `path`, or `None` to leave the file alone.
    fn format(&self, path: &str, content: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// Re-pretty-prints `*.json` files with two-space indentation and a trailing
/// newline. Key order is kept. Content that does not parse is left as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn format(&self, path: &str, content: &[u8]) -> Result<Option<Vec<u8>>> {
        if !path.ends_with(".json") {
            return Ok(None);
        }

        let value: serde_json::Value = match serde_json::from_slice(content) {
            Ok(value) => value,
            Err(e) => {
                debug!("Not formatting {}: {}", path, e);
                return Ok(None);
            }
        };

        let mut formatted =
            serde_json::to_string_pretty(&value).map_err(|e| Error::Serialization {
                message: format!("Failed to format {}: {}", path, e),
            })?;
        formatted.push('\n');
        Ok(Some(formatted.into_bytes()))
    }
}

/// Leaves every file untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn name(&self) -> &'static str {
        "none"
    }

    fn format(&self, _path: &str, _content: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Format every pending create or update in the tree.
///
/// Returns the paths whose content changed.
pub fn format_files(tree: &mut Tree<'_>, formatter: &dyn Formatter) -> Result<Vec<String>> {
    let candidates: Vec<String> = tree
        .changes()
        .into_iter()
        .filter(|change| change.kind != ChangeKind::Delete)
        .map(|change| change.path)
        .collect();

    let mut formatted = Vec::new();
    for path in candidates {
        let content = tree.read(&path)?;
        match formatter.format(&path, &content)? {
            Some(output) if output != content => {
                tree.replace_staged(&path, output)?;
                formatted.push(path);
            }
            _ => {}
        }
    }

    debug!(
        "Formatter '{}' rewrote {} file(s)",
        formatter.name(),
        formatted.len()
    );
    Ok(formatted)
}
