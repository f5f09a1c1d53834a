//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `treegen`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global color
//!   flag and performs the command's logic.
//!
//! `run` and `generate` share [`run_invocations`], which builds the backing
//! store, formatter and task runner and calls into the library orchestrator.

use anyhow::Result;
use std::path::{Path, PathBuf};

use treegen::filesystem::DiskStore;
use treegen::format::{Formatter, JsonFormatter, NoopFormatter};
use treegen::output::{emoji, print_report, OutputConfig};
use treegen::phases::{orchestrator, RunOptions, StepInvocation};
use treegen::tasks::SerialRunner;

use treegen::suggestions;

pub mod generate;
pub mod list;
pub mod run;

/// Resolve `--root`, defaulting to the current directory.
pub(crate) fn workspace_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(suggestions::root_not_found(&root));
    }
    Ok(root)
}

/// Run `invocations` against the workspace at `root` and print the outcome.
pub(crate) fn run_invocations(
    root: &Path,
    invocations: &[StepInvocation],
    options: &RunOptions,
    out: &OutputConfig,
) -> Result<()> {
    let mut store = DiskStore::new(root);
    let formatter: &dyn Formatter = if options.skip_format {
        &NoopFormatter
    } else {
        &JsonFormatter
    };

    match orchestrator::execute(
        &mut store,
        invocations,
        formatter,
        &mut SerialRunner,
        options,
    ) {
        Ok(report) => {
            print_report(out, &report);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} Generation failed", emoji(out, "❌", "[ERR]"));
            let steps = e.step_path();
            if !steps.is_empty() {
                eprintln!("   in step: {}", steps.join(" > "));
            }
            Err(e.into())
        }
    }
}
