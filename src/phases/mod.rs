//! The phases of one treegen invocation.
//!
//! ## Overview
//!
//! An invocation runs a list of generation steps against one staged tree:
//! 1. Validating - Every step's options are checked before anything runs
//! 2. Mutating - Steps run in order against the tree, collecting tasks
//! 3. Formatting - Changed files are formatted once
//! 4. Flushing - The tree is committed to the backing store
//! 5. Executing - Deferred tasks run in creation order
//!
//! A failure before the flush leaves the backing store untouched. A dry run
//! stops after formatting and reports the pending change list.
//!
//! The orchestrator walks the states of [`InvocationState`] in order and
//! ends in `Flushed`, or in `Failed` when any phase errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::tree::{FileChange, FlushReport};

pub mod generate;
pub mod orchestrator;
pub mod tasks;
pub mod write;

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Validating,
    Mutating,
    TasksPending,
    Executing,
    Flushed,
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvocationState::Validating => "validating",
            InvocationState::Mutating => "mutating",
            InvocationState::TasksPending => "tasks pending",
            InvocationState::Executing => "executing",
            InvocationState::Flushed => "flushed",
            InvocationState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One step to run: a built-in generator name and its JSON options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepInvocation {
    pub generator: String,
    #[serde(default = "empty_options")]
    pub options: Value,
}

impl StepInvocation {
    pub fn new(generator: impl Into<String>, options: Value) -> Self {
        Self {
            generator: generator.into(),
            options,
        }
    }
}

fn empty_options() -> Value {
    Value::Object(Map::new())
}

/// Switches for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report the change list without flushing or running tasks
    pub dry_run: bool,
    /// Skip the formatting pass
    pub skip_format: bool,
    /// Flush but leave deferred tasks unrun
    pub skip_tasks: bool,
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReport {
    /// `Flushed`, or `TasksPending` for a dry run
    pub state: InvocationState,
    /// Changes in flush order, as they stood before the flush
    pub changes: Vec<FileChange>,
    /// What the flush applied; `None` for a dry run
    pub flush: Option<FlushReport>,
    /// Names of the tasks that ran, in order
    pub tasks_run: Vec<String>,
    /// Names of the tasks that were collected but not run
    pub tasks_skipped: Vec<String>,
}
