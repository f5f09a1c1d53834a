//! The `executor` step: a new executor inside an existing plugin

use super::generator::{register_in_collection, Collection};
use super::library::TestRunner;
use super::{name_substitutions, Generator};
use crate::error::{Error, Result};
use crate::path::names;
use crate::registry::read_project;
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions};
use crate::tree::Tree;
use serde::Deserialize;
use serde_json::{json, Value};

const TEMPLATE: &[(&str, &str)] = &[
    (
        "__fileName__/executor.ts__template__",
        include_str!("../../templates/executor/__fileName__/executor.ts__template__"),
    ),
    (
        "__fileName__/executor.spec.ts__template__",
        include_str!("../../templates/executor/__fileName__/executor.spec.ts__template__"),
    ),
    (
        "__fileName__/schema.json__template__",
        include_str!("../../templates/executor/__fileName__/schema.json__template__"),
    ),
    (
        "__fileName__/schema.d.ts__template__",
        include_str!("../../templates/executor/__fileName__/schema.d.ts__template__"),
    ),
];

const HASHER_TEMPLATE: &[(&str, &str)] = &[
    (
        "__fileName__/hasher.ts__template__",
        include_str!("../../templates/hasher/__fileName__/hasher.ts__template__"),
    ),
    (
        "__fileName__/hasher.spec.ts__template__",
        include_str!("../../templates/hasher/__fileName__/hasher.spec.ts__template__"),
    ),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorOptions {
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit_test_runner: TestRunner,
    #[serde(default)]
    pub include_hasher: bool,
}

/// Adds an executor (and optionally a task hasher) to a plugin project.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorGenerator;

const FIELDS: &[Field] = &[
    Field::required("project", FieldKind::String),
    Field::required("name", FieldKind::String),
    Field::optional("description", FieldKind::String),
    Field::optional("unitTestRunner", FieldKind::OneOf(&["jest", "none"])),
    Field::optional("includeHasher", FieldKind::Boolean),
];

impl Generator for ExecutorGenerator {
    type Options = ExecutorOptions;

    fn name(&self) -> &'static str {
        "executor"
    }

    fn description(&self) -> &'static str {
        "Add an executor to an existing plugin"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "executor",
            fields: FIELDS,
        }
    }

    fn validate(&self, tree: &Tree<'_>, options: &ExecutorOptions) -> Result<()> {
        if options.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        read_project(tree, &options.project)?;
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: ExecutorOptions) -> Result<Tasks> {
        let project = read_project(tree, &options.project)?;
        let executors_dir = format!("{}/executors", project.source_root_or_default());
        let file_name = names(&options.name).file_name;
        let description = options
            .description
            .clone()
            .unwrap_or_else(|| format!("{} executor", options.name));

        let mut substitutions = name_substitutions(&options.name, &project.root);
        substitutions.insert("description".to_string(), description.clone());

        let mut template = bundle(TEMPLATE)?;
        if options.include_hasher {
            for (path, content) in HASHER_TEMPLATE {
                template.add_file_string(path, content)?;
            }
        }
        generate_files(
            tree,
            &template,
            &executors_dir,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        if options.unit_test_runner == TestRunner::None {
            for spec in ["executor.spec.ts", "hasher.spec.ts"] {
                tree.delete(&format!("{}/{}/{}", executors_dir, file_name, spec))?;
            }
        }

        let mut entry = json!({
            "implementation": format!("./src/executors/{}/executor", file_name),
            "schema": format!("./src/executors/{}/schema.json", file_name),
            "description": description,
        });
        if options.include_hasher {
            entry["hasher"] = Value::from(format!("./src/executors/{}/hasher", file_name));
        }
        register_in_collection(
            tree,
            &project.root,
            &Collection::EXECUTORS,
            &options.name,
            entry,
            false,
        )?;

        Ok(Tasks::new())
    }
}
