//! Root package manifest dependencies

use crate::error::{Error, Result};
use crate::merge::json::update_json_or;
use crate::tasks::{install_packages_task, Tasks};
use crate::tree::Tree;
use log::debug;
use serde_json::{Map, Value};

/// Path of the workspace package manifest.
pub const PACKAGE_JSON: &str = "package.json";

/// Add missing `dependencies` and `devDependencies` to the root `package.json`.
///
/// A package already listed in either section keeps its version. Returns an
/// install task only when the manifest actually changed.
pub fn add_dependencies_to_package_json(
    tree: &mut Tree<'_>,
    dependencies: &[(&str, &str)],
    dev_dependencies: &[(&str, &str)],
) -> Result<Tasks> {
    let mut changed = false;
    update_json_or(tree, PACKAGE_JSON, Value::Object(Map::new()), |mut manifest| {
        let existing = |manifest: &Value, name: &str| {
            ["dependencies", "devDependencies"]
                .iter()
                .any(|section| manifest[*section].get(name).is_some())
        };

        let sections = [
            ("dependencies", dependencies),
            ("devDependencies", dev_dependencies),
        ];
        for (section, entries) in sections {
            for (name, version) in entries {
                if existing(&manifest, *name) {
                    continue;
                }
                section_mut(&mut manifest, section)?
                    .insert(name.to_string(), Value::from(*version));
                debug!("Adding {} {}@{}", section, name, version);
                changed = true;
            }
        }
        Ok(manifest)
    })?;

    let mut tasks = Tasks::new();
    if changed {
        tasks.push(install_packages_task(tree));
    }
    Ok(tasks)
}

/// Mutable access to a dependency section, created when missing.
pub(crate) fn section_mut<'a>(
    manifest: &'a mut Value,
    section: &str,
) -> Result<&'a mut Map<String, Value>> {
    let Some(root) = manifest.as_object_mut() else {
        return Err(Error::Parse {
            path: PACKAGE_JSON.to_string(),
            message: "manifest is not an object".to_string(),
        });
    };
    root.entry(section)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::Parse {
            path: PACKAGE_JSON.to_string(),
            message: format!("'{}' is not an object", section),
        })
}
