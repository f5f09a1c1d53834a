//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Invocation file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

/// Generate an error for when the invocation file is not found.
///
/// Includes hints about:
/// - Creating a new invocation file
/// - Using the -c/--config flag
/// - Using the TREEGEN_CONFIG environment variable
/// - Running a single generator instead
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Invocation file not found: {path}\n\n\
         hint: Create a .treegen.yaml file in your workspace root\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set TREEGEN_CONFIG environment variable\n\
         hint: Use 'treegen generate <GENERATOR>' to run a single generator",
        path = path.display()
    )
}

/// Generate an error for an unknown generator name.
///
/// Includes the list of built-in generators.
pub fn unknown_generator(name: &str, generators: &[&str]) -> anyhow::Error {
    let suggestion = find_similar(name, generators);
    let did_you_mean = suggestion
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown generator: {name}{did_you_mean}\n\n\
         Built-in generators are: {list}\n\
         hint: Run 'treegen list' to see each generator's options",
        list = generators.join(", ")
    )
}

/// Generate an error for an `--options` value that is not a JSON object.
pub fn invalid_options_json(error: &serde_json::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid --options value\n\
         error: {error}\n\n\
         hint: Pass a JSON object, e.g. --options '{{\"name\": \"my-plugin\"}}'\n\
         hint: Use -o key=value for individual options"
    )
}

/// Generate an error for a `-o` value without `=`.
pub fn invalid_option_pair(pair: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid option: {pair}\n\n\
         hint: Use -o key=value, e.g. -o name=my-plugin\n\
         hint: Run 'treegen list' to see each option's kind"
    )
}

/// Generate an error for a workspace root that does not exist.
pub fn root_not_found(root: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Workspace directory not found: {root}\n\n\
         hint: Use --root to point at an existing directory",
        root = root.display()
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
