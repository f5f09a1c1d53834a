//! The `preset` step: a workspace whose root project is a plugin

use super::create_package::{CreatePackageGenerator, CreatePackageOptions};
use super::dependencies::{section_mut, PACKAGE_JSON};
use super::plugin::{PluginGenerator, PluginOptions};
use super::{run, Generator};
use crate::error::{Error, Result};
use crate::merge::json::update_json_or;
use crate::registry::update_workspace;
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::tree::Tree;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

const NX_PLUGIN_PACKAGE: &str = "@nx/nx-plugin";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetOptions {
    /// Package name of the plugin, optionally scoped
    pub plugin_name: String,
    #[serde(default)]
    pub create_package_name: Option<String>,
}

impl PresetOptions {
    /// The plugin's project name: the package name without its scope.
    fn project_name(&self) -> &str {
        match self.plugin_name.split_once('/') {
            Some((_, name)) => name,
            None => &self.plugin_name,
        }
    }
}

/// Turns the workspace root into a plugin project.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetGenerator;

const FIELDS: &[Field] = &[
    Field::required("pluginName", FieldKind::String),
    Field::optional("createPackageName", FieldKind::String),
];

impl Generator for PresetGenerator {
    type Options = PresetOptions;

    fn name(&self) -> &'static str {
        "preset"
    }

    fn description(&self) -> &'static str {
        "Set up a workspace whose root project is a plugin"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "preset",
            fields: FIELDS,
        }
    }

    fn validate(&self, _tree: &Tree<'_>, options: &PresetOptions) -> Result<()> {
        if options.project_name().trim().is_empty() {
            return Err(Error::validation("pluginName", "must name a package"));
        }
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: PresetOptions) -> Result<Tasks> {
        let project_name = options.project_name().to_string();

        let mut tasks = run(
            &PluginGenerator,
            tree,
            PluginOptions {
                name: project_name.clone(),
                import_path: Some(options.plugin_name.clone()),
                root_project: true,
                ..Default::default()
            },
        )?;

        update_workspace(tree, |workspace| {
            workspace.npm_scope = None;
            Ok(())
        })?;
        move_nx_plugin_to_dev_dependencies(tree)?;

        if let Some(name) = options.create_package_name {
            tasks.extend(run(
                &CreatePackageGenerator,
                tree,
                CreatePackageOptions {
                    name,
                    project: project_name,
                    ..Default::default()
                },
            )?);
        }

        Ok(tasks)
    }
}

fn move_nx_plugin_to_dev_dependencies(tree: &mut Tree<'_>) -> Result<()> {
    update_json_or(tree, PACKAGE_JSON, Value::Object(Map::new()), |mut manifest| {
        let entry = manifest
            .get_mut("dependencies")
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.remove(NX_PLUGIN_PACKAGE));

        if let Some(version) = entry {
            debug!("Moving {} to devDependencies", NX_PLUGIN_PACKAGE);
            section_mut(&mut manifest, "devDependencies")?
                .insert(NX_PLUGIN_PACKAGE.to_string(), version);
        }
        Ok(manifest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFS;
    use crate::merge::json::read_json;
    use crate::registry::{read_project, read_workspace, WORKSPACE_FILE};
    use serde_json::json;

    fn workspace(store: &mut MemoryFS) {
        store
            .add_file_string(
                WORKSPACE_FILE,
                r#"{"version": 2, "npmScope": "acme", "projects": {}}"#,
            )
            .unwrap();
        store
            .add_file_string(
                PACKAGE_JSON,
                r#"{"name": "acme", "dependencies": {"@nx/nx-plugin": "16.5.1"}}"#,
            )
            .unwrap();
    }

    fn options(plugin_name: &str) -> PresetOptions {
        PresetOptions {
            plugin_name: plugin_name.to_string(),
            create_package_name: None,
        }
    }

    #[test]
    fn test_scoped_plugin_name() {
        assert_eq!(options("@acme/my-plugin").project_name(), "my-plugin");
        assert_eq!(options("my-plugin").project_name(), "my-plugin");
    }

    #[test]
    fn test_root_plugin_project() {
        let mut store = MemoryFS::new();
        workspace(&mut store);
        let mut tree = Tree::new(&mut store);
        run(&PresetGenerator, &mut tree, options("@acme/my-plugin")).unwrap();

        let project = read_project(&tree, "my-plugin").unwrap();
        assert_eq!(project.root, ".");
        assert_eq!(read_json(&tree, PACKAGE_JSON).unwrap()["name"], "@acme/my-plugin");
        assert!(tree.exists("src/generators/my-plugin/generator.ts"));
        assert!(tree.exists("generators.json"));
        assert!(read_project(&tree, "my-plugin-e2e").is_ok());
    }

    #[test]
    fn test_removes_npm_scope() {
        let mut store = MemoryFS::new();
        workspace(&mut store);
        let mut tree = Tree::new(&mut store);
        run(&PresetGenerator, &mut tree, options("@acme/my-plugin")).unwrap();

        assert_eq!(read_workspace(&tree).unwrap().npm_scope, None);
        let raw = read_json(&tree, WORKSPACE_FILE).unwrap();
        assert!(raw.get("npmScope").is_none());
    }

    #[test]
    fn test_moves_nx_plugin_to_dev_dependencies() {
        let mut store = MemoryFS::new();
        workspace(&mut store);
        let mut tree = Tree::new(&mut store);
        run(&PresetGenerator, &mut tree, options("@acme/my-plugin")).unwrap();

        let manifest = read_json(&tree, PACKAGE_JSON).unwrap();
        assert!(manifest["dependencies"].get(NX_PLUGIN_PACKAGE).is_none());
        assert_eq!(manifest["devDependencies"][NX_PLUGIN_PACKAGE], "16.5.1");
    }

    #[test]
    fn test_create_package() {
        let mut store = MemoryFS::new();
        workspace(&mut store);
        let mut tree = Tree::new(&mut store);
        let opts = PresetOptions {
            create_package_name: Some("create-my-plugin".to_string()),
            ..options("@acme/my-plugin")
        };
        let tasks = run(&PresetGenerator, &mut tree, opts).unwrap();

        let project = read_project(&tree, "create-my-plugin").unwrap();
        assert_eq!(project.root, "libs/create-my-plugin");
        let entry = tree.read_to_string("libs/create-my-plugin/bin/index.ts").unwrap();
        assert!(entry.contains("createWorkspace(`@acme/my-plugin@${presetVersion}`"));
        assert_eq!(
            read_json(&tree, "libs/create-my-plugin/package.json").unwrap()["bin"],
            json!({"create-my-plugin": "./bin/index.js"})
        );
        assert!(!tasks.is_empty());
    }

    #[test]
    fn test_scope_only_name_rejected() {
        let mut store = MemoryFS::new();
        let mut tree = Tree::new(&mut store);
        let err = run(&PresetGenerator, &mut tree, options("@acme/")).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Validation { field, .. } if field == "pluginName"));
        assert!(tree.changes().is_empty());
    }
}
