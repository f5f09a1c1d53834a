//! Executing phase: deferred tasks after a successful flush

use log::info;

use crate::error::Result;
use crate::tasks::{run_tasks_in_serial, TaskRunner, Tasks};

/// Run `tasks` in creation order, or report them as skipped.
///
/// Returns `(ran, skipped)` task names.
pub fn execute(
    tasks: Tasks,
    runner: &mut dyn TaskRunner,
    skip: bool,
) -> Result<(Vec<String>, Vec<String>)> {
    if skip {
        let skipped = tasks.names();
        if !skipped.is_empty() {
            info!("Skipping {} deferred task(s)", skipped.len());
        }
        return Ok((Vec::new(), skipped));
    }

    Ok((run_tasks_in_serial(tasks, runner)?, Vec::new()))
}
