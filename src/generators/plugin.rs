//! The `plugin` step: a publishable plugin library
//!
//! Composes `library`, `generator`, `executor` and `e2e-project`. The
//! returned tasks are ordered library, dependencies, e2e.

use super::dependencies::add_dependencies_to_package_json;
use super::e2e_project::{E2eProjectGenerator, E2eProjectOptions};
use super::executor::{ExecutorGenerator, ExecutorOptions};
use super::generator::{GeneratorGenerator, GeneratorOptions};
use super::library::{normalize, Bundler, LibraryGenerator, LibraryOptions, TestRunner};
use super::{name_substitutions, run, Generator};
use crate::error::{Error, Result};
use crate::path::join_path_fragments;
use crate::registry::{append_target_asset_rule, read_project, workspace_layout, AssetRule};
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions};
use crate::tree::Tree;
use crate::versions::{
    NX_VERSION, SWC_CORE_VERSION, SWC_HELPERS_VERSION, SWC_NODE_VERSION, TSLIB_VERSION,
};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

const TEMPLATE: &[(&str, &str)] = &[
    ("README.md__template__", include_str!("../../templates/plugin/README.md__template__")),
    ("src/index.ts__template__", include_str!("../../templates/plugin/src/index.ts__template__")),
];

/// Compiler used for the plugin's `build` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    #[default]
    Tsc,
    Swc,
}

impl From<Compiler> for Bundler {
    fn from(compiler: Compiler) -> Self {
        match compiler {
            Compiler::Tsc => Bundler::Tsc,
            Compiler::Swc => Bundler::Swc,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    pub name: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub import_path: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub compiler: Compiler,
    #[serde(default)]
    pub unit_test_runner: TestRunner,
    #[serde(default)]
    pub e2e_test_runner: TestRunner,
    #[serde(default)]
    pub minimal: bool,
    #[serde(default)]
    pub root_project: bool,
}

impl PluginOptions {
    fn library_options(&self) -> LibraryOptions {
        LibraryOptions {
            name: self.name.clone(),
            directory: self.directory.clone(),
            import_path: self.import_path.clone(),
            tags: self.tags.clone(),
            publishable: true,
            bundler: self.compiler.into(),
            unit_test_runner: self.unit_test_runner,
            root_project: self.root_project,
        }
    }
}

/// Creates a plugin library wired with a generator, an executor and an
/// e2e project.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginGenerator;

const FIELDS: &[Field] = &[
    Field::required("name", FieldKind::String),
    Field::optional("directory", FieldKind::String),
    Field::optional("importPath", FieldKind::String),
    Field::optional("tags", FieldKind::String),
    Field::optional("compiler", FieldKind::OneOf(&["tsc", "swc"])),
    Field::optional("unitTestRunner", FieldKind::OneOf(&["jest", "none"])),
    Field::optional("e2eTestRunner", FieldKind::OneOf(&["jest", "none"])),
    Field::optional("minimal", FieldKind::Boolean),
    Field::optional("rootProject", FieldKind::Boolean),
];

impl Generator for PluginGenerator {
    type Options = PluginOptions;

    fn name(&self) -> &'static str {
        "plugin"
    }

    fn description(&self) -> &'static str {
        "Create a plugin library with a generator, an executor and an e2e project"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "plugin",
            fields: FIELDS,
        }
    }

    fn validate(&self, _tree: &Tree<'_>, options: &PluginOptions) -> Result<()> {
        if options.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: PluginOptions) -> Result<Tasks> {
        let mut library_options = options.library_options();
        let lib = normalize(tree, &library_options)?;
        library_options.import_path = Some(lib.import_path.clone());

        let mut tasks = run(&LibraryGenerator, tree, library_options)?;

        tasks.extend(add_dependencies_to_package_json(
            tree,
            &[
                ("@nx/devkit", NX_VERSION),
                ("tslib", TSLIB_VERSION),
                ("@swc/helpers", SWC_HELPERS_VERSION),
            ],
            &[
                ("@nx/jest", NX_VERSION),
                ("@nx/js", NX_VERSION),
                ("@nx/nx-plugin", NX_VERSION),
                ("@swc-node/register", SWC_NODE_VERSION),
                ("@swc/core", SWC_CORE_VERSION),
            ],
        )?);

        tree.delete(&join_path_fragments(&[&lib.project_root, "src/lib"])?)?;
        let mut substitutions = name_substitutions(&lib.project_name, &lib.project_root);
        substitutions.insert("projectName".to_string(), lib.project_name.clone());
        substitutions.insert("npmPackageName".to_string(), lib.import_path.clone());
        generate_files(
            tree,
            &bundle(TEMPLATE)?,
            &lib.project_root,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        if !options.minimal {
            run(
                &GeneratorGenerator,
                tree,
                GeneratorOptions {
                    project: lib.project_name.clone(),
                    name: lib.project_name.clone(),
                    description: None,
                    unit_test_runner: options.unit_test_runner,
                },
            )?;
            run(
                &ExecutorGenerator,
                tree,
                ExecutorOptions {
                    project: lib.project_name.clone(),
                    name: "build".to_string(),
                    description: None,
                    unit_test_runner: options.unit_test_runner,
                    include_hasher: false,
                },
            )?;
        }

        let project = read_project(tree, &lib.project_name)?;
        let build_output = project
            .targets
            .get("build")
            .and_then(|build| build.options.get("outputPath"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if project.targets.contains_key("build") {
            for rule in asset_rules(&lib.project_root) {
                append_target_asset_rule(tree, &lib.project_name, "build", &rule)?;
            }
        }

        if options.e2e_test_runner != TestRunner::None {
            let plugin_output_path = match build_output {
                Some(path) => path,
                None => {
                    let (layout, _) = workspace_layout(tree)?;
                    join_path_fragments(&["dist", &layout.libs_dir, &lib.project_directory])?
                }
            };
            debug!("e2e project will install {}", plugin_output_path);
            tasks.extend(run(
                &E2eProjectGenerator,
                tree,
                E2eProjectOptions {
                    plugin_name: lib.project_name.clone(),
                    npm_package_name: Some(lib.import_path.clone()),
                    project_directory: Some(lib.project_directory.clone()),
                    plugin_output_path: Some(plugin_output_path),
                    minimal: options.minimal,
                },
            )?);
        }

        Ok(tasks)
    }
}

/// Asset rules that ship non-TypeScript sources, declarations and the
/// collection documents with the built plugin.
fn asset_rules(project_root: &str) -> [AssetRule; 4] {
    let (root, src) = if project_root == "." {
        (".".to_string(), "./src".to_string())
    } else {
        (format!("./{}", project_root), format!("./{}/src", project_root))
    };

    [
        AssetRule::new(src.clone(), "**/!(*.ts)", "./src"),
        AssetRule::new(src, "**/*.d.ts", "./src"),
        AssetRule::new(root.clone(), "generators.json", "."),
        AssetRule::new(root, "executors.json", "."),
    ]
}
