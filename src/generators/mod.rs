//! Generation steps
//!
//! A generation step receives the staged tree and validated options, mutates
//! the tree, and returns the [`Tasks`] it wants run after the flush. Steps
//! compose by calling [`run`] on other steps and concatenating the returned
//! task lists in call order.
//!
//! ## Built-in steps
//!
//! - `library`: a TypeScript library project
//! - `plugin`: a plugin library with generator, executor and e2e project
//! - `generator`: a generator inside an existing plugin
//! - `executor`: an executor inside an existing plugin
//! - `e2e-project`: an end-to-end test project for a plugin
//! - `create-package`: a `create-*` CLI package for a plugin
//! - `preset`: a whole plugin workspace rooted at the workspace root
//! - `files`: an on-disk template directory rendered into the workspace
//!
//! Steps are strongly typed through the [`Generator`] trait. The orchestrator
//! and CLI drive them through the object-safe [`DynGenerator`] with JSON
//! options.

use crate::error::{Error, Result};
use crate::path::offset_from_root;
use crate::schema::OptionsSchema;
use crate::tasks::Tasks;
use crate::template::Substitutions;
use crate::tree::Tree;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod create_package;
pub mod dependencies;
pub mod e2e_project;
pub mod executor;
pub mod files;
pub mod generator;
pub mod library;
pub mod plugin;
pub mod preset;

pub use create_package::CreatePackageGenerator;
pub use e2e_project::E2eProjectGenerator;
pub use executor::ExecutorGenerator;
pub use files::FilesGenerator;
pub use generator::GeneratorGenerator;
pub use library::LibraryGenerator;
pub use plugin::PluginGenerator;
pub use preset::PresetGenerator;

/// A composable generation step.
pub trait Generator {
    /// Typed options, deserialized from camelCase JSON.
    type Options: DeserializeOwned;

    /// Name used in invocation files, the CLI and error messages.
    fn name(&self) -> &'static str;

    /// One-line summary for `treegen list`.
    fn description(&self) -> &'static str;

    /// Declared option shape.
    fn schema(&self) -> OptionsSchema;

    /// Checks against the current tree that must pass before any mutation.
    fn validate(&self, _tree: &Tree<'_>, _options: &Self::Options) -> Result<()> {
        Ok(())
    }

    /// Mutate the tree and return the deferred tasks.
    fn generate(&self, tree: &mut Tree<'_>, options: Self::Options) -> Result<Tasks>;
}

/// Validate and run a step, tagging any failure with the step's name.
pub fn run<G>(generator: &G, tree: &mut Tree<'_>, options: G::Options) -> Result<Tasks>
where
    G: Generator + ?Sized,
{
    debug!("Running generator {}", generator.name());
    let result = generator
        .validate(tree, &options)
        .and_then(|()| generator.generate(tree, options));

    match result {
        Ok(tasks) => {
            info!(
                "Generator {} finished with {} deferred task(s)",
                generator.name(),
                tasks.len()
            );
            Ok(tasks)
        }
        Err(e) => Err(e.in_step(generator.name())),
    }
}

/// Name, description and schema of a step.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: OptionsSchema,
}

/// Object-safe view of a [`Generator`] taking JSON options.
pub trait DynGenerator {
    fn info(&self) -> GeneratorInfo;

    /// Check JSON options against the schema and the typed options.
    ///
    /// Does not look at the tree, so every invocation of a run can be checked
    /// before the first one mutates anything.
    fn check_options(&self, options: &Value) -> Result<()>;

    /// Check, deserialize and run with JSON options.
    fn invoke(&self, tree: &mut Tree<'_>, options: &Value) -> Result<Tasks>;
}

impl<G: Generator> DynGenerator for G {
    fn info(&self) -> GeneratorInfo {
        GeneratorInfo {
            name: self.name(),
            description: self.description(),
            schema: self.schema(),
        }
    }

    fn check_options(&self, options: &Value) -> Result<()> {
        parse_options::<G>(self, options)
            .map(|_| ())
            .map_err(|e| e.in_step(self.name()))
    }

    fn invoke(&self, tree: &mut Tree<'_>, options: &Value) -> Result<Tasks> {
        let typed = parse_options::<G>(self, options).map_err(|e| e.in_step(self.name()))?;
        run(self, tree, typed)
    }
}

fn parse_options<G: Generator>(generator: &G, options: &Value) -> Result<G::Options> {
    generator.schema().validate(options)?;
    serde_json::from_value(options.clone()).map_err(|e| Error::validation("options", e.to_string()))
}

/// Every built-in step, in listing order.
pub fn builtin() -> Vec<Box<dyn DynGenerator>> {
    vec![
        Box::new(LibraryGenerator),
        Box::new(PluginGenerator),
        Box::new(GeneratorGenerator),
        Box::new(ExecutorGenerator),
        Box::new(E2eProjectGenerator),
        Box::new(CreatePackageGenerator),
        Box::new(PresetGenerator),
        Box::new(FilesGenerator),
    ]
}

/// Look up a built-in step by name.
pub fn find(name: &str) -> Option<Box<dyn DynGenerator>> {
    builtin().into_iter().find(|g| g.info().name == name)
}

/// Names of every built-in step.
pub fn builtin_names() -> Vec<&'static str> {
    builtin().iter().map(|g| g.info().name).collect()
}

/// Standard substitutions derived from a name and a project root.
pub(crate) fn name_substitutions(name: &str, project_root: &str) -> Substitutions {
    let n = crate::path::names(name);
    Substitutions::from([
        ("name".to_string(), n.name),
        ("fileName".to_string(), n.file_name),
        ("className".to_string(), n.class_name),
        ("propertyName".to_string(), n.property_name),
        ("constantName".to_string(), n.constant_name),
        ("projectRoot".to_string(), project_root.to_string()),
        ("offsetFromRoot".to_string(), offset_from_root(project_root)),
    ])
}

/// Comma-separated tags to a clean list.
pub(crate) fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Default npm package name for a project directory.
pub(crate) fn import_path(npm_scope: Option<&str>, project_directory: &str) -> String {
    match npm_scope {
        Some(scope) if !scope.is_empty() => {
            format!("@{}/{}", scope.trim_start_matches('@'), project_directory)
        }
        _ => project_directory.to_string(),
    }
}
