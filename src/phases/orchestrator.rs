//! Orchestrator for a complete invocation
//!
//! This module coordinates all phases to provide a clean API for running a
//! list of generation steps against a backing store.

use log::{error, info};

use super::{generate, tasks, write, InvocationReport, InvocationState, RunOptions, StepInvocation};
use crate::error::Result;
use crate::filesystem::BackingStore;
use crate::format::{format_files, Formatter};
use crate::tasks::{TaskRunner, Tasks};
use crate::tree::Tree;

/// A generation step as a closure over the staged tree.
pub type Step<'g> = Box<dyn FnOnce(&mut Tree<'_>) -> Result<Tasks> + 'g>;

/// Execute invocations of built-in steps.
///
/// Every invocation is resolved and its options checked before the first step
/// runs, so a bad invocation anywhere in the list fails without mutating.
pub fn execute(
    store: &mut dyn BackingStore,
    invocations: &[StepInvocation],
    formatter: &dyn Formatter,
    runner: &mut dyn TaskRunner,
    options: &RunOptions,
) -> Result<InvocationReport> {
    info!("Validating {} step invocation(s)", invocations.len());
    let resolved = generate::resolve(invocations).inspect_err(|e| {
        error!(
            "Invocation {} during {}: {}",
            InvocationState::Failed,
            InvocationState::Validating,
            e
        );
    })?;

    let steps: Vec<Step<'_>> = vec![Box::new(move |tree: &mut Tree<'_>| {
        generate::execute(tree, resolved)
    })];
    execute_steps(store, steps, formatter, runner, options)
}

/// Execute already-constructed steps.
///
/// 1. Run steps in order, concatenating their tasks
/// 2. Format changed files once (unless `skip_format`)
/// 3. Stop here for a dry run
/// 4. Flush the tree to the store
/// 5. Run tasks in creation order (unless `skip_tasks`)
pub fn execute_steps(
    store: &mut dyn BackingStore,
    steps: Vec<Step<'_>>,
    formatter: &dyn Formatter,
    runner: &mut dyn TaskRunner,
    options: &RunOptions,
) -> Result<InvocationReport> {
    let mut state = InvocationState::Mutating;
    let result = run_phases(store, steps, formatter, runner, options, &mut state);
    if let Err(e) = &result {
        error!("Invocation {} during {}: {}", InvocationState::Failed, state, e);
    }
    result
}

fn run_phases(
    store: &mut dyn BackingStore,
    steps: Vec<Step<'_>>,
    formatter: &dyn Formatter,
    runner: &mut dyn TaskRunner,
    options: &RunOptions,
    state: &mut InvocationState,
) -> Result<InvocationReport> {
    let mut tree = Tree::new(store);

    // Mutating
    let mut collected = Tasks::new();
    for step in steps {
        collected.extend(step(&mut tree)?);
    }

    if !options.skip_format {
        format_files(&mut tree, formatter)?;
    }

    *state = InvocationState::TasksPending;
    let changes = tree.changes();
    info!(
        "{} change(s) staged, {} task(s) pending",
        changes.len(),
        collected.len()
    );

    if options.dry_run {
        return Ok(InvocationReport {
            state: *state,
            changes,
            flush: None,
            tasks_run: Vec::new(),
            tasks_skipped: collected.names(),
        });
    }

    let flush = write::execute(tree)?;

    *state = InvocationState::Executing;
    let (tasks_run, tasks_skipped) = tasks::execute(collected, runner, options.skip_tasks)?;

    *state = InvocationState::Flushed;
    Ok(InvocationReport {
        state: *state,
        changes,
        flush: Some(flush),
        tasks_run,
        tasks_skipped,
    })
}
