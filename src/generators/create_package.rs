//! The `create-package` step: a `create-*` CLI package for a plugin

use super::dependencies::add_dependencies_to_package_json;
use super::library::{normalize, LibraryGenerator, LibraryOptions, TestRunner};
use super::plugin::Compiler;
use super::{name_substitutions, run, Generator};
use crate::error::{Error, Result};
use crate::merge::json::{read_json, update_json};
use crate::path::join_path_fragments;
use crate::registry::{read_project, update_project};
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions};
use crate::tree::Tree;
use crate::versions::NX_VERSION;
use serde::Deserialize;
use serde_json::{Map, Value};

const TEMPLATE: &[(&str, &str)] = &[(
    "bin/index.ts__template__",
    include_str!("../../templates/create-package/bin/index.ts__template__"),
)];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageOptions {
    /// Package name, also used as the npm package name
    pub name: String,
    /// The plugin the package creates workspaces with
    pub project: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub unit_test_runner: TestRunner,
    #[serde(default)]
    pub compiler: Compiler,
}

/// Creates a CLI package that bootstraps a workspace with a plugin's preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePackageGenerator;

const FIELDS: &[Field] = &[
    Field::required("name", FieldKind::String),
    Field::required("project", FieldKind::String),
    Field::optional("directory", FieldKind::String),
    Field::optional("unitTestRunner", FieldKind::OneOf(&["jest", "none"])),
    Field::optional("compiler", FieldKind::OneOf(&["tsc", "swc"])),
];

impl Generator for CreatePackageGenerator {
    type Options = CreatePackageOptions;

    fn name(&self) -> &'static str {
        "create-package"
    }

    fn description(&self) -> &'static str {
        "Create a CLI package that creates workspaces with a plugin's preset"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "create-package",
            fields: FIELDS,
        }
    }

    fn validate(&self, tree: &Tree<'_>, options: &CreatePackageOptions) -> Result<()> {
        if options.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        read_project(tree, &options.project)?;
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: CreatePackageOptions) -> Result<Tasks> {
        let plugin = read_project(tree, &options.project)?;
        let plugin_manifest = join_path_fragments(&[&plugin.root, "package.json"])?;
        let preset = if tree.is_file(&plugin_manifest) {
            read_json(tree, &plugin_manifest)?["name"]
                .as_str()
                .unwrap_or(&options.project)
                .to_string()
        } else {
            options.project.clone()
        };

        let library_options = LibraryOptions {
            name: options.name.clone(),
            directory: options.directory.clone(),
            import_path: Some(options.name.clone()),
            publishable: true,
            bundler: options.compiler.into(),
            unit_test_runner: options.unit_test_runner,
            ..Default::default()
        };
        let lib = normalize(tree, &library_options)?;
        let mut tasks = run(&LibraryGenerator, tree, library_options)?;

        tree.delete(&lib.source_root)?;
        let mut substitutions = name_substitutions(&options.name, &lib.project_root);
        substitutions.insert("preset".to_string(), preset);
        substitutions.insert("projectName".to_string(), options.project.clone());
        generate_files(
            tree,
            &bundle(TEMPLATE)?,
            &lib.project_root,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        let bin_root = join_path_fragments(&[&lib.project_root, "bin"])?;
        update_project(tree, &lib.project_name, |project| {
            project.source_root = Some(bin_root.clone());
            if let Some(build) = project.targets.get_mut("build") {
                build
                    .options
                    .insert("main".to_string(), Value::from(format!("{}/index.ts", bin_root)));
                build.options.insert(
                    "updateBuildableProjectDepsInPackageJson".to_string(),
                    Value::Bool(false),
                );
            }
            Ok(())
        })?;

        let manifest_path = join_path_fragments(&[&lib.project_root, "package.json"])?;
        let bin_name = options.name.clone();
        update_json(tree, &manifest_path, |mut manifest| {
            let mut bin = Map::new();
            bin.insert(bin_name, Value::from("./bin/index.js"));
            manifest["bin"] = Value::Object(bin);
            Ok(manifest)
        })?;

        tasks.extend(add_dependencies_to_package_json(
            tree,
            &[("create-nx-workspace", NX_VERSION)],
            &[],
        )?);
        Ok(tasks)
    }
}
