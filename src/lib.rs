//! # Treegen Library
//!
//! This library provides composable workspace generators that run against a
//! staged, in-memory view of a file tree. It is designed to be used by the
//! `treegen` command-line tool but can also drive generators from other
//! applications or tests.
//!
//! ## Quick Example
//!
//! ```
//! use treegen::filesystem::MemoryFS;
//! use treegen::tree::{ChangeKind, Tree};
//! use treegen::config;
//!
//! // A backing store with one existing file
//! let mut store = MemoryFS::new();
//! store.add_file_string("README.md", "# Workspace").unwrap();
//!
//! // Stage changes over it
//! let mut tree = Tree::new(&mut store);
//! tree.write("README.md", "# My Workspace").unwrap();
//! tree.write("libs/a/index.ts", "export {};").unwrap();
//!
//! let kinds: Vec<_> = tree.changes().into_iter().map(|c| c.kind).collect();
//! assert_eq!(kinds, vec![ChangeKind::Update, ChangeKind::Create]);
//!
//! // Parse an invocation file
//! let steps = config::parse(r#"
//! - generator: plugin
//!   options:
//!     name: my-plugin
//! "#).unwrap();
//! assert_eq!(steps[0].generator, "plugin");
//! ```
//!
//! ## Core Concepts
//!
//! - **Staged tree (`tree`, `filesystem`)**: A copy-on-write overlay over a
//!   backing store. Nothing reaches the store until the tree is committed.
//! - **Templates (`template`)**: Directories of files with `<%= key %>`
//!   content placeholders and `__key__` path placeholders.
//! - **Generators (`generators`)**: Named steps that validate their options,
//!   mutate the tree, and return deferred tasks. Steps compose by calling
//!   each other against the same tree.
//! - **Registry (`registry`)**: The `workspace.json` project registry.
//! - **Tasks (`tasks`)**: Deferred actions, such as a package install, that
//!   run after the tree has been flushed.
//! - **Phases (`phases`)**: The orchestrator that validates, mutates, formats,
//!   flushes and finally runs tasks.
//!
//! ## Execution Flow
//!
//! 1.  **Validating**: Every step's options are checked against its schema.
//! 2.  **Mutating**: Steps run in order against one staged tree.
//! 3.  **Formatting**: Changed files are formatted once.
//! 4.  **Flushing**: The tree is committed to the backing store.
//! 5.  **Executing**: Deferred tasks run in creation order.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod format;
pub mod generators;
pub mod merge;
pub mod output;
pub mod path;
pub mod phases;
pub mod registry;
pub mod schema;
pub mod suggestions;
pub mod tasks;
pub mod template;
pub mod tree;
pub mod versions;

#[cfg(test)]
mod path_proptest;
