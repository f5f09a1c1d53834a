//! # Error Handling
//!
//! This module defines the centralized error type for `treegen`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! mode of the generation engine, with enough context in each variant to
//! tell the user what went wrong and where.
//!
//! ## Error Kinds
//!
//! The variants fall into three groups, distinguished by *when* they can
//! occur relative to the flush of the staged tree:
//!
//! - **Before flush**: `Validation`, `NotFound`, `DuplicateProject`, `Parse`,
//!   `UnboundPlaceholder`, `Merge`, `Path`. Any of these aborts the whole
//!   invocation and the backing store is left untouched.
//! - **During flush**: `Flush`. Paths applied before the failing one stay
//!   on the backing store; nothing is rolled back or retried.
//! - **After flush**: `Task`. A deferred task failed; earlier tasks' effects
//!   stand and the remaining tasks are not run.
//!
//! `Step` wraps any error raised inside a generation step with the step's
//! name. Nested steps nest the wrapper, so the display string reads like a
//! call path. Use [`Error::root_cause`] to get at the underlying kind.

use thiserror::Error;

/// Main error type for treegen operations
#[derive(Error, Debug)]
pub enum Error {
    /// Options or inputs were rejected before any mutation happened.
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A file, project, target, or generator could not be found.
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// A project with the same name is already registered.
    #[error("Project already exists: {name}")]
    DuplicateProject { name: String },

    /// A structured document or template could not be parsed.
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// A template referenced a key missing from the substitution map.
    #[error("Unbound template placeholder '{placeholder}' in {path}")]
    UnboundPlaceholder { placeholder: String, path: String },

    /// Writing the staged tree to the backing store failed part way.
    ///
    /// `applied` counts the changes that reached the store before the failure.
    #[error("Flush failed at {path} after {applied} applied change(s): {message}")]
    Flush {
        path: String,
        message: String,
        applied: usize,
    },

    /// A deferred task failed after the tree was flushed.
    #[error("Task '{task}' failed: {message}")]
    Task { task: String, message: String },

    /// An error raised inside a generation step, tagged with the step name.
    #[error("Generator '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<Error>,
    },

    /// A structured path could not be navigated inside a document.
    #[error("Merge operation error: {operation} - {message}")]
    Merge { operation: String, message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An error occurred in a backing store operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred while parsing a `.treegen.yaml` invocation file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred during serialization.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Shorthand for a `Validation` error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Wrap this error with the name of the step it was raised in.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Error::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every `Step` wrapper removed.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Step { source, .. } = current {
            current = source;
        }
        current
    }

    /// The chain of step names from the outermost step inwards.
    pub fn step_path(&self) -> Vec<&str> {
        let mut steps = Vec::new();
        let mut current = self;
        while let Error::Step { step, source } = current {
            steps.push(step.as_str());
            current = source;
        }
        steps
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
