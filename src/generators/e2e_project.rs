//! The `e2e-project` step: an end-to-end test project for a plugin

use super::dependencies::add_dependencies_to_package_json;
use super::{name_substitutions, Generator};
use crate::error::{Error, Result};
use crate::merge::json::read_json;
use crate::path::{join_path_fragments, names};
use crate::registry::{
    add_project, read_project, workspace_layout, ProjectConfiguration, ProjectType,
    TargetConfiguration,
};
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions};
use crate::tree::Tree;
use crate::versions::{JEST_TYPES_VERSION, JEST_VERSION, NX_VERSION, TS_JEST_VERSION};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

const COMMON_TEMPLATE: &[(&str, &str)] = &[
    (
        "jest.config.ts__template__",
        include_str!("../../templates/e2e-project/common/jest.config.ts__template__"),
    ),
    (
        "tsconfig.json__template__",
        include_str!("../../templates/e2e-project/common/tsconfig.json__template__"),
    ),
    (
        "tsconfig.spec.json__template__",
        include_str!("../../templates/e2e-project/common/tsconfig.spec.json__template__"),
    ),
];

const MINIMAL_SPEC: (&str, &str) = (
    "tests/__pluginName__.spec.ts__template__",
    include_str!("../../templates/e2e-project/minimal/tests/__pluginName__.spec.ts__template__"),
);

const FULL_SPEC: (&str, &str) = (
    "tests/__pluginName__.spec.ts__template__",
    include_str!("../../templates/e2e-project/full/tests/__pluginName__.spec.ts__template__"),
);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct E2eProjectOptions {
    pub plugin_name: String,
    #[serde(default)]
    pub npm_package_name: Option<String>,
    #[serde(default)]
    pub project_directory: Option<String>,
    #[serde(default)]
    pub plugin_output_path: Option<String>,
    #[serde(default)]
    pub minimal: bool,
}

/// Registers `<plugin>-e2e` and renders its jest setup and spec.
#[derive(Debug, Clone, Copy, Default)]
pub struct E2eProjectGenerator;

const FIELDS: &[Field] = &[
    Field::required("pluginName", FieldKind::String),
    Field::optional("npmPackageName", FieldKind::String),
    Field::optional("projectDirectory", FieldKind::String),
    Field::optional("pluginOutputPath", FieldKind::String),
    Field::optional("minimal", FieldKind::Boolean),
];

impl Generator for E2eProjectGenerator {
    type Options = E2eProjectOptions;

    fn name(&self) -> &'static str {
        "e2e-project"
    }

    fn description(&self) -> &'static str {
        "Create an end-to-end test project for a plugin"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "e2e-project",
            fields: FIELDS,
        }
    }

    fn validate(&self, tree: &Tree<'_>, options: &E2eProjectOptions) -> Result<()> {
        if options.plugin_name.trim().is_empty() {
            return Err(Error::validation("pluginName", "must not be empty"));
        }
        read_project(tree, &options.plugin_name)?;
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: E2eProjectOptions) -> Result<Tasks> {
        let plugin = read_project(tree, &options.plugin_name)?;
        let (layout, _) = workspace_layout(tree)?;

        let project_name = format!("{}-e2e", options.plugin_name);
        let directory = options
            .project_directory
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| names(d.trim_matches('/')).file_name)
            .unwrap_or_else(|| options.plugin_name.clone());
        let project_root =
            join_path_fragments(&[&layout.apps_dir, &format!("{}-e2e", directory)])?;

        let npm_package_name = match options.npm_package_name.clone() {
            Some(name) => name,
            None => plugin_package_name(tree, &plugin.root)?
                .unwrap_or_else(|| options.plugin_name.clone()),
        };
        let plugin_output_path = options.plugin_output_path.clone().unwrap_or_else(|| {
            plugin
                .targets
                .get("build")
                .and_then(|build| build.options.get("outputPath"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("dist/{}", plugin.root))
        });

        add_project(
            tree,
            &project_name,
            project_configuration(&project_root, &options.plugin_name),
        )?;

        let mut substitutions = name_substitutions(&options.plugin_name, &project_root);
        substitutions.insert("projectName".to_string(), project_name);
        substitutions.insert("pluginName".to_string(), options.plugin_name.clone());
        substitutions.insert("npmPackageName".to_string(), npm_package_name);
        substitutions.insert("pluginOutputPath".to_string(), plugin_output_path);

        let mut template = bundle(COMMON_TEMPLATE)?;
        let (spec_path, spec) = if options.minimal { MINIMAL_SPEC } else { FULL_SPEC };
        template.add_file_string(spec_path, spec)?;
        generate_files(
            tree,
            &template,
            &project_root,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        add_dependencies_to_package_json(
            tree,
            &[],
            &[
                ("@nx/jest", NX_VERSION),
                ("jest", JEST_VERSION),
                ("ts-jest", TS_JEST_VERSION),
                ("@types/jest", JEST_TYPES_VERSION),
            ],
        )
    }
}

fn plugin_package_name(tree: &Tree<'_>, plugin_root: &str) -> Result<Option<String>> {
    let manifest_path = join_path_fragments(&[plugin_root, "package.json"])?;
    if !tree.is_file(&manifest_path) {
        return Ok(None);
    }
    Ok(read_json(tree, &manifest_path)?["name"]
        .as_str()
        .map(str::to_string))
}

fn project_configuration(project_root: &str, plugin_name: &str) -> ProjectConfiguration {
    let mut e2e_options = Map::new();
    e2e_options.insert(
        "jestConfig".to_string(),
        Value::from(format!("{}/jest.config.ts", project_root)),
    );
    e2e_options.insert("runInBand".to_string(), Value::Bool(true));

    ProjectConfiguration {
        root: project_root.to_string(),
        source_root: Some(format!("{}/tests", project_root)),
        project_type: Some(ProjectType::Application),
        targets: IndexMap::from([(
            "e2e".to_string(),
            TargetConfiguration {
                executor: "@nx/jest:jest".to_string(),
                outputs: vec!["{workspaceRoot}/coverage/{projectRoot}".to_string()],
                options: e2e_options,
                ..Default::default()
            },
        )]),
        implicit_dependencies: vec![plugin_name.to_string()],
        ..Default::default()
    }
}
