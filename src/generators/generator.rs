//! The `generator` step: a new generator inside an existing plugin

use super::library::TestRunner;
use super::{name_substitutions, Generator};
use crate::error::{Error, Result};
use crate::merge::json::{create_json_if_absent, read_json, update_json};
use crate::path::{join_path_fragments, names};
use crate::registry::read_project;
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions, TEMPLATE_MARKER};
use crate::tree::Tree;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const TEMPLATE: &[(&str, &str)] = &[
    (
        "__fileName__/generator.ts__template__",
        include_str!("../../templates/generator/__fileName__/generator.ts__template__"),
    ),
    (
        "__fileName__/generator.spec.ts__template__",
        include_str!("../../templates/generator/__fileName__/generator.spec.ts__template__"),
    ),
    (
        "__fileName__/schema.json__template__",
        include_str!("../../templates/generator/__fileName__/schema.json__template__"),
    ),
    (
        "__fileName__/schema.d.ts__template__",
        include_str!("../../templates/generator/__fileName__/schema.d.ts__template__"),
    ),
];

/// Content seeded into a new generator's own template directory.
pub const SEED_TEMPLATE: &str = "const variable = \"<%= projectName %>\";";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit_test_runner: TestRunner,
}

/// Adds a generator to a plugin project and registers it in the
/// project's generator collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorGenerator;

const FIELDS: &[Field] = &[
    Field::required("project", FieldKind::String),
    Field::required("name", FieldKind::String),
    Field::optional("description", FieldKind::String),
    Field::optional("unitTestRunner", FieldKind::OneOf(&["jest", "none"])),
];

impl Generator for GeneratorGenerator {
    type Options = GeneratorOptions;

    fn name(&self) -> &'static str {
        "generator"
    }

    fn description(&self) -> &'static str {
        "Add a generator to an existing plugin"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "generator",
            fields: FIELDS,
        }
    }

    fn validate(&self, tree: &Tree<'_>, options: &GeneratorOptions) -> Result<()> {
        if options.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        read_project(tree, &options.project)?;
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: GeneratorOptions) -> Result<Tasks> {
        let project = read_project(tree, &options.project)?;
        let source_root = project.source_root_or_default();
        let file_name = names(&options.name).file_name;
        let description = options
            .description
            .clone()
            .unwrap_or_else(|| format!("{} generator", options.name));

        let manifest_path = join_path_fragments(&[&project.root, "package.json"])?;
        let npm_package_name = read_json(tree, &manifest_path)?["name"]
            .as_str()
            .unwrap_or(&options.project)
            .to_string();

        let seed_path = format!(
            "{}/generators/{}/files/src/index.ts{}",
            source_root, file_name, TEMPLATE_MARKER
        );
        if !tree.exists(&seed_path) {
            tree.write(&seed_path, SEED_TEMPLATE)?;
        }

        let mut substitutions = name_substitutions(&options.name, &project.root);
        substitutions.insert("description".to_string(), description.clone());
        substitutions.insert("npmPackageName".to_string(), npm_package_name);

        let generators_dir = format!("{}/generators", source_root);
        generate_files(
            tree,
            &bundle(TEMPLATE)?,
            &generators_dir,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        if options.unit_test_runner == TestRunner::None {
            tree.delete(&format!("{}/{}/generator.spec.ts", generators_dir, file_name))?;
        }

        let entry = json!({
            "factory": format!("./src/generators/{}/generator", file_name),
            "schema": format!("./src/generators/{}/schema.json", file_name),
            "description": description,
        });
        register_in_collection(
            tree,
            &project.root,
            &Collection::GENERATORS,
            &options.name,
            entry,
            options.name == "preset",
        )?;

        Ok(Tasks::new())
    }
}

/// Layout of a generator or executor collection document.
pub(crate) struct Collection {
    /// Key in the collection document and pointer key in package.json
    pub key: &'static str,
    /// Older spelling of `key`, read when `key` is absent
    pub legacy_key: &'static str,
    pub default_file: &'static str,
}

impl Collection {
    pub const GENERATORS: Collection = Collection {
        key: "generators",
        legacy_key: "schematics",
        default_file: "generators.json",
    };

    pub const EXECUTORS: Collection = Collection {
        key: "executors",
        legacy_key: "builders",
        default_file: "executors.json",
    };
}

/// Set `collection[key][name] = entry` in the collection a project's
/// package.json points at, creating the collection and the pointer when
/// missing. Sibling entries are left alone.
pub(crate) fn register_in_collection(
    tree: &mut Tree<'_>,
    project_root: &str,
    collection: &Collection,
    name: &str,
    entry: Value,
    standalone_preset: bool,
) -> Result<()> {
    let manifest_path = join_path_fragments(&[project_root, "package.json"])?;
    let manifest = read_json(tree, &manifest_path)?;
    let pointer = manifest
        .get(collection.key)
        .or_else(|| manifest.get(collection.legacy_key))
        .and_then(Value::as_str)
        .map(str::to_string);

    let collection_path = match &pointer {
        Some(pointer) => join_path_fragments(&[project_root, pointer])?,
        None => join_path_fragments(&[project_root, collection.default_file])?,
    };

    if !tree.exists(&collection_path) {
        debug!("Creating {}", collection_path);
        if pointer.is_none() {
            let default_pointer = format!("./{}", collection.default_file);
            update_json(tree, &manifest_path, |mut manifest| {
                manifest[collection.key] = Value::from(default_pointer);
                Ok(manifest)
            })?;
        }
        let mut empty = Map::new();
        empty.insert(collection.key.to_string(), Value::Object(Map::new()));
        create_json_if_absent(tree, &collection_path, &Value::Object(empty))?;
    }

    update_json(tree, &collection_path, |mut document| {
        let mut entries = match document
            .get(collection.key)
            .or_else(|| document.get(collection.legacy_key))
        {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };

        let mut entry = entry;
        if standalone_preset {
            entry["x-use-standalone-layout"] = Value::Bool(true);
        }
        entries.insert(name.to_string(), entry);

        let Some(root) = document.as_object_mut() else {
            return Err(Error::Parse {
                path: collection_path.clone(),
                message: "collection document is not an object".to_string(),
            });
        };
        root.insert(collection.key.to_string(), Value::Object(entries));
        Ok(document)
    })
}
