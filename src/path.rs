//! Path manipulation utilities for treegen
//!
//! Every path handed to the staged tree goes through [`normalize_path`], so
//! the overlay, the backing stores, and the document helpers all agree on a
//! single spelling of each file: `/`-separated, relative to the workspace
//! root, with `.` and `..` segments resolved.

use crate::error::{Error, Result};
use glob::Pattern;

/// Normalize a workspace-relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, `..` pops
/// the previous segment, and a leading `/` is ignored. The workspace root
/// itself normalizes to the empty string. A `..` that would climb above the
/// root is an error.
pub fn normalize_path(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::Path {
                        message: format!("'{}' escapes the workspace root", path),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}

/// Join path fragments and normalize the result.
pub fn join_path_fragments(fragments: &[&str]) -> Result<String> {
    normalize_path(&fragments.join("/"))
}

/// The parent directory of a normalized path (`""` for top-level entries).
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The relative prefix that leads from `dir` back to the workspace root.
///
/// `libs/my-plugin` yields `../../`; the root itself yields `./`.
pub fn offset_from_root(dir: &str) -> String {
    match normalize_path(dir) {
        Ok(normalized) if !normalized.is_empty() => "../".repeat(normalized.split('/').count()),
        _ => "./".to_string(),
    }
}

/// Match a path against a glob pattern
pub fn glob_match(pattern: &str, path: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    Ok(pattern.matches(path))
}

/// Name variants derived from a user-supplied name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// The name as given
    pub name: String,
    /// PascalCase, e.g. `MyPlugin`
    pub class_name: String,
    /// camelCase, e.g. `myPlugin`
    pub property_name: String,
    /// SCREAMING_SNAKE, e.g. `MY_PLUGIN`
    pub constant_name: String,
    /// kebab-case, e.g. `my-plugin`
    pub file_name: String,
}

/// Derive file, class, property, and constant spellings of a name.
pub fn names(name: &str) -> Names {
    let file_name = to_file_name(name);
    let property_name = to_property_name(name);
    let class_name = capitalize(&property_name);
    let constant_name = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_uppercase();

    Names {
        name: name.to_string(),
        class_name,
        property_name,
        constant_name,
        file_name,
    }
}

fn to_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for (idx, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('-');
        }
        match c {
            '_' if idx == 0 => out.push('_'),
            ' ' | '_' => out.push('-'),
            other => out.push(other.to_ascii_lowercase()),
        }
        prev = Some(c);
    }

    out
}

fn to_property_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if upper_next {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
