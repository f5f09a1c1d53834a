//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::PLUGIN);
//!     fixture.command().arg("run").arg("--skip-tasks").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::read_json;
    pub use super::TestFixture;
}

/// Common invocation file snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// A plugin without an e2e project.
    pub const PLUGIN: &str = r#"
- generator: plugin
  options:
    name: my-plugin
    e2eTestRunner: none
"#;

    /// A minimal plugin followed by an executor in shorthand form.
    pub const PLUGIN_AND_EXECUTOR: &str = r#"
- generator: plugin
  options:
    name: my-plugin
    minimal: true
    e2eTestRunner: none
- executor: { project: my-plugin, name: echo }
"#;

    /// Two libraries with the same name; the second step fails.
    pub const DUPLICATE_LIBRARY: &str = r#"
- library: { name: shared }
- library: { name: shared }
"#;

    /// A step naming a generator that does not exist.
    pub const UNKNOWN_GENERATOR: &str = r#"
- generator: plugn
  options: { name: x }
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "- generator: [unclosed";
}

/// Read and parse a JSON file below `root`.
#[allow(dead_code)]
pub fn read_json(root: &Path, path: &str) -> serde_json::Value {
    let content = std::fs::read_to_string(root.join(path))
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path, e))
}

/// A test fixture that provides a temporary workspace with optional config.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::PLUGIN)
///     .with_file("package.json", "{}");
///
/// fixture.command().arg("run").arg("--skip-tasks").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.treegen.yaml` invocation file with the given content.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".treegen.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// Colors are turned off so output assertions see plain text.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("treegen");
        cmd.current_dir(self.path())
            .env_remove("TREEGEN_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
