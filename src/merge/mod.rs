//! Structured document operations
//!
//! Generation steps edit configuration documents (package manifests, the
//! workspace registry, generator and executor collections) through this
//! module rather than by rewriting file text. Each helper reads the current
//! document from the staged tree, applies a transform, and writes the result
//! back through the tree, so later steps always observe earlier edits.
//!
//! Only JSON documents are handled (json.rs). The `PathSegment` type and
//! [`parse_path`] navigate nested values for the path-targeted helpers.

pub mod json;

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "targets.build.options" or "assets[0].glob"
/// are parsed into a sequence of PathSegments for navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key for accessing object members
    Key(String),
    /// A numeric index for accessing array elements
    Index(usize),
}

/// Parse a path string into segments for JSON navigation
///
/// Supports:
/// - Dot notation: `foo.bar.baz`
/// - Bracket notation: `foo["bar"]` or `foo['bar']`
/// - Array indices: `foo[0]` or `items[1].name`
/// - Escaped characters: `foo\.bar` (literal dot)
/// - Mixed: `dependencies["@nx/devkit"]`
///
/// # Examples
///
/// ```
/// use treegen::merge::parse_path;
///
/// let segments = parse_path("targets.build.options.assets[0]");
/// assert_eq!(segments.len(), 5);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.trim().is_empty() || path == "/" {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
            }
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.next_if(|c| *c == '"' || *c == '\'') {
                    Some(quote_char) => {
                        let mut key = String::new();
                        let mut bracket_escaped = false;

                        while let Some(ch) = chars.next() {
                            if bracket_escaped {
                                key.push(ch);
                                bracket_escaped = false;
                            } else if ch == '\\' {
                                bracket_escaped = true;
                            } else if ch == quote_char && chars.next_if_eq(&']').is_some() {
                                break;
                            } else {
                                key.push(ch);
                            }
                        }

                        segments.push(PathSegment::Key(key));
                    }
                    None => {
                        let bracket_content: String =
                            chars.by_ref().take_while(|c| *c != ']').collect();
                        let trimmed = bracket_content.trim();

                        if let Ok(idx) = trimmed.parse::<usize>() {
                            segments.push(PathSegment::Index(idx));
                        } else if !trimmed.is_empty() {
                            segments.push(PathSegment::Key(trimmed.to_string()));
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}
