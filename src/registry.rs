//! Project registry
//!
//! The registry is the `workspace.json` document at the workspace root. It
//! names every project and holds each project's build and run targets. All
//! reads and writes go through the staged tree and the JSON helpers in
//! [`crate::merge::json`], so a project added by one step is visible to the
//! next step of the same invocation.
//!
//! Edits are applied to the parsed document rather than re-serializing the
//! typed structs, so key order, empty lists and keys this crate does not
//! model are written back as they were read. Only the values a mutator
//! actually changed are touched.

use crate::error::{Error, Result};
use crate::merge::json::{read_json, read_json_as, write_json};
use crate::tree::Tree;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path of the registry document, relative to the workspace root.
pub const WORKSPACE_FILE: &str = "workspace.json";

/// The whole registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm_scope: Option<String>,
    #[serde(default)]
    pub workspace_layout: WorkspaceLayout,
    #[serde(default)]
    pub projects: IndexMap<String, ProjectConfiguration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            npm_scope: None,
            workspace_layout: WorkspaceLayout::default(),
            projects: IndexMap::new(),
            extra: Map::new(),
        }
    }
}

fn default_version() -> u32 {
    2
}

/// Where applications and libraries live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceLayout {
    #[serde(default = "default_apps_dir")]
    pub apps_dir: String,
    #[serde(default = "default_libs_dir")]
    pub libs_dir: String,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            apps_dir: default_apps_dir(),
            libs_dir: default_libs_dir(),
        }
    }
}

fn default_apps_dir() -> String {
    "apps".to_string()
}

fn default_libs_dir() -> String {
    "libs".to_string()
}

/// Declared kind of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Application,
    Library,
}

/// A registered project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub targets: IndexMap<String, TargetConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implicit_dependencies: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfiguration {
    /// The source root, falling back to `<root>/src`.
    pub fn source_root_or_default(&self) -> String {
        match &self.source_root {
            Some(source_root) => source_root.clone(),
            None if self.root == "." || self.root.is_empty() => "src".to_string(),
            None => format!("{}/src", self.root),
        }
    }
}

/// A named build or run target of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfiguration {
    /// Empty for command-only targets.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub executor: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configurations: IndexMap<String, Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a target's `assets` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRule {
    pub input: String,
    pub glob: String,
    pub output: String,
}

impl AssetRule {
    pub fn new(
        input: impl Into<String>,
        glob: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            glob: glob.into(),
            output: output.into(),
        }
    }
}

/// Read the registry, or the default registry when none exists yet.
pub fn read_workspace(tree: &Tree<'_>) -> Result<WorkspaceConfig> {
    if !tree.is_file(WORKSPACE_FILE) {
        return Ok(WorkspaceConfig::default());
    }
    read_json_as(tree, WORKSPACE_FILE)
}

/// Replace the registry document.
pub fn write_workspace(tree: &mut Tree<'_>, workspace: &WorkspaceConfig) -> Result<()> {
    write_json(tree, WORKSPACE_FILE, workspace)
}

/// Read-modify-write of the registry document.
///
/// The mutator sees the typed registry. Only the values it changes are
/// written back; everything else in the document keeps its position and
/// shape. Nothing is written when the mutator fails or changes nothing.
pub fn update_workspace<F>(tree: &mut Tree<'_>, mutator: F) -> Result<()>
where
    F: FnOnce(&mut WorkspaceConfig) -> Result<()>,
{
    let mut document = if tree.is_file(WORKSPACE_FILE) {
        read_json(tree, WORKSPACE_FILE)?
    } else {
        to_json_value(&WorkspaceConfig::default())?
    };

    let mut workspace: WorkspaceConfig =
        serde_json::from_value(document.clone()).map_err(|e| Error::Parse {
            path: WORKSPACE_FILE.to_string(),
            message: e.to_string(),
        })?;
    let before = to_json_value(&workspace)?;
    mutator(&mut workspace)?;
    let after = to_json_value(&workspace)?;

    if before == after && tree.is_file(WORKSPACE_FILE) {
        return Ok(());
    }
    apply_changes(&mut document, &before, &after);
    write_json(tree, WORKSPACE_FILE, &document)
}

fn to_json_value(workspace: &WorkspaceConfig) -> Result<Value> {
    serde_json::to_value(workspace).map_err(|e| Error::Serialization {
        message: format!("Failed to serialize {}: {}", WORKSPACE_FILE, e),
    })
}

/// Carry the difference between `before` and `after` over to `original`.
///
/// Keys whose value did not change are left exactly as `original` has them,
/// including ones the typed view drops. New keys are appended and removed
/// keys are dropped in place.
fn apply_changes(original: &mut Value, before: &Value, after: &Value) {
    if before == after {
        return;
    }
    match (original, before, after) {
        (Value::Object(original), Value::Object(before), Value::Object(after)) => {
            for (key, value) in after {
                let previous = before.get(key);
                if previous == Some(value) {
                    continue;
                }
                match (original.get_mut(key), previous) {
                    (Some(slot), Some(previous)) => apply_changes(slot, previous, value),
                    _ => {
                        original.insert(key.clone(), value.clone());
                    }
                }
            }
            original.retain(|key, _| after.contains_key(key) || !before.contains_key(key));
        }
        (original, _, after) => *original = after.clone(),
    }
}

/// The workspace's apps/libs directories and npm scope.
pub fn workspace_layout(tree: &Tree<'_>) -> Result<(WorkspaceLayout, Option<String>)> {
    let workspace = read_workspace(tree)?;
    Ok((workspace.workspace_layout, workspace.npm_scope))
}

/// Registered project names in registration order.
pub fn project_names(tree: &Tree<'_>) -> Result<Vec<String>> {
    Ok(read_workspace(tree)?.projects.into_keys().collect())
}

/// Register a new project.
///
/// # Errors
///
/// `Error::Validation` for an empty name, `Error::DuplicateProject` when the
/// name is taken. The registry is unchanged in both cases.
pub fn add_project(tree: &mut Tree<'_>, name: &str, project: ProjectConfiguration) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "project name must not be empty"));
    }

    update_workspace(tree, |workspace| {
        if workspace.projects.contains_key(name) {
            return Err(Error::DuplicateProject {
                name: name.to_string(),
            });
        }

        debug!("Registering project {} at {}", name, project.root);
        workspace.projects.insert(name.to_string(), project);
        Ok(())
    })
}

/// Read one project.
pub fn read_project(tree: &Tree<'_>, name: &str) -> Result<ProjectConfiguration> {
    read_workspace(tree)?
        .projects
        .shift_remove(name)
        .ok_or_else(|| Error::not_found("Project", name))
}

/// Read-modify-write of one project. Other projects are left alone.
pub fn update_project<F>(tree: &mut Tree<'_>, name: &str, mutator: F) -> Result<()>
where
    F: FnOnce(&mut ProjectConfiguration) -> Result<()>,
{
    update_workspace(tree, |workspace| {
        let project = workspace
            .projects
            .get_mut(name)
            .ok_or_else(|| Error::not_found("Project", name))?;
        mutator(project)
    })
}

/// Append `rule` to the `assets` option of a target unless an equal rule is
/// already present.
///
/// Returns whether the rule was appended. Existing rules keep their order.
pub fn append_target_asset_rule(
    tree: &mut Tree<'_>,
    project: &str,
    target: &str,
    rule: &AssetRule,
) -> Result<bool> {
    let rule_value = serde_json::to_value(rule).map_err(|e| Error::Serialization {
        message: format!("Failed to serialize asset rule: {}", e),
    })?;

    let mut appended = false;
    update_project(tree, project, |config| {
        let target_config = config
            .targets
            .get_mut(target)
            .ok_or_else(|| Error::not_found("Target", format!("{}:{}", project, target)))?;

        let assets = target_config
            .options
            .entry("assets")
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(rules) = assets else {
            return Err(Error::Merge {
                operation: "append asset rule".to_string(),
                message: format!("'{}:{}' has a non-list assets option", project, target),
            });
        };

        if !rules.contains(&rule_value) {
            rules.push(rule_value);
            appended = true;
        }
        Ok(())
    })?;

    Ok(appended)
}
