//! Validating and Mutating phases
//!
//! Resolves every invocation to a built-in step and checks its options up
//! front, then runs the steps in order against the tree.

use log::{debug, info};

use super::StepInvocation;
use crate::error::{Error, Result};
use crate::generators::{self, DynGenerator};
use crate::tasks::Tasks;
use crate::tree::Tree;

/// A step resolved and checked, ready to run.
pub struct ResolvedStep<'a> {
    pub generator: Box<dyn DynGenerator>,
    pub invocation: &'a StepInvocation,
}

/// Resolve and check every invocation without touching any tree.
///
/// # Errors
///
/// `NotFound` for an unknown generator name, or the first option error,
/// tagged with the step's name.
pub fn resolve(invocations: &[StepInvocation]) -> Result<Vec<ResolvedStep<'_>>> {
    invocations
        .iter()
        .map(|invocation| {
            let generator = generators::find(&invocation.generator)
                .ok_or_else(|| Error::not_found("Generator", invocation.generator.clone()))?;
            generator.check_options(&invocation.options)?;
            debug!("Options for {} are valid", invocation.generator);
            Ok(ResolvedStep {
                generator,
                invocation,
            })
        })
        .collect()
}

/// Run resolved steps in order, concatenating their tasks.
pub fn execute(tree: &mut Tree<'_>, steps: Vec<ResolvedStep<'_>>) -> Result<Tasks> {
    let mut tasks = Tasks::new();
    for step in steps {
        tasks.extend(step.generator.invoke(tree, &step.invocation.options)?);
    }
    info!("Steps staged {} change(s)", tree.changes().len());
    Ok(tasks)
}
