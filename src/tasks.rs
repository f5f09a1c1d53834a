//! Deferred tasks
//!
//! Generation steps never perform side effects such as installing packages
//! while they mutate the tree. Instead they return [`Tasks`]: an ordered list
//! of named, zero-argument, fallible actions. A composite step concatenates
//! the task lists of the steps it invokes, in invocation order, and the
//! orchestrator runs the final list only after every step has succeeded and
//! the tree has been flushed.

use crate::error::{Error, Result};
use crate::tree::Tree;
use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

type Action = Box<dyn FnOnce() -> Result<()>>;

/// A named side-effecting action deferred until after the flush.
pub struct Task {
    name: String,
    action: Action,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume the task and run its action.
    pub fn run(self) -> Result<()> {
        (self.action)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

/// Ordered list of deferred tasks, in creation order.
#[derive(Debug, Default)]
pub struct Tasks {
    tasks: Vec<Task>,
}

impl Tasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one task.
    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Append every task of a sub-step, keeping their order.
    pub fn extend(&mut self, other: Tasks) {
        self.tasks.extend(other.tasks);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name.clone()).collect()
    }
}

impl From<Task> for Tasks {
    fn from(task: Task) -> Self {
        Self { tasks: vec![task] }
    }
}

impl IntoIterator for Tasks {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl FromIterator<Task> for Tasks {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

/// Executes deferred tasks on behalf of the orchestrator.
pub trait TaskRunner {
    fn run(&mut self, task: Task) -> Result<()>;
}

/// Runs each task in place on the calling thread.
#[derive(Debug, Default)]
pub struct SerialRunner;

impl TaskRunner for SerialRunner {
    fn run(&mut self, task: Task) -> Result<()> {
        task.run()
    }
}

/// Run `tasks` one after the other through `runner`.
///
/// Returns the names of the tasks that ran. The first failure stops the
/// sequence: tasks after it are not run, tasks before it are not undone.
pub fn run_tasks_in_serial(tasks: Tasks, runner: &mut dyn TaskRunner) -> Result<Vec<String>> {
    let mut completed = Vec::with_capacity(tasks.len());
    for task in tasks {
        let name = task.name().to_string();
        debug!("Running task {}", name);
        if let Err(e) = runner.run(task) {
            return Err(match e {
                Error::Task { .. } => e,
                other => Error::Task {
                    task: name,
                    message: other.to_string(),
                },
            });
        }
        completed.push(name);
    }
    info!("Ran {} task(s)", completed.len());
    Ok(completed)
}

/// Package manager used by the install task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Pick the package manager from the lock files present in the tree.
    pub fn detect(tree: &Tree<'_>) -> Self {
        if tree.is_file("pnpm-lock.yaml") {
            PackageManager::Pnpm
        } else if tree.is_file("yarn.lock") {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }
}

/// A task that runs `<package manager> install` in the workspace root.
///
/// When the tree has no on-disk root (an in-memory store) the task logs a
/// warning and does nothing.
pub fn install_packages_task(tree: &Tree<'_>) -> Task {
    let manager = PackageManager::detect(tree);
    let root: Option<PathBuf> = tree.root().map(|p| p.to_path_buf());

    Task::new(format!("{} install", manager.command()), move || {
        let Some(root) = root else {
            warn!("No workspace directory to install packages in; skipping");
            return Ok(());
        };

        info!("Running {} install in {}", manager.command(), root.display());
        let status = Command::new(manager.command())
            .arg("install")
            .current_dir(&root)
            .status()
            .map_err(|e| Error::Task {
                task: format!("{} install", manager.command()),
                message: format!("failed to start: {}", e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Task {
                task: format!("{} install", manager.command()),
                message: format!("exited with {}", status),
            })
        }
    })
}
