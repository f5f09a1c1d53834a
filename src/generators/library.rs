//! The `library` step: a TypeScript library project

use super::dependencies::add_dependencies_to_package_json;
use super::{import_path, name_substitutions, parse_tags, Generator};
use crate::error::{Error, Result};
use crate::merge::json::update_json_or;
use crate::path::{join_path_fragments, names};
use crate::registry::{
    add_project, read_workspace, ProjectConfiguration, ProjectType, TargetConfiguration,
};
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{bundle, generate_files, MaterializeOptions};
use crate::tree::Tree;
use crate::versions::{
    JEST_TYPES_VERSION, JEST_VERSION, NX_VERSION, SWC_CORE_VERSION, SWC_HELPERS_VERSION,
    TS_JEST_VERSION,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const TEMPLATE: &[(&str, &str)] = &[
    ("README.md__template__", include_str!("../../templates/library/README.md__template__")),
    (
        "jest.config.ts__template__",
        include_str!("../../templates/library/jest.config.ts__template__"),
    ),
    (
        "tsconfig.json__template__",
        include_str!("../../templates/library/tsconfig.json__template__"),
    ),
    (
        "tsconfig.lib.json__template__",
        include_str!("../../templates/library/tsconfig.lib.json__template__"),
    ),
    (
        "tsconfig.spec.json__template__",
        include_str!("../../templates/library/tsconfig.spec.json__template__"),
    ),
    ("src/index.ts__template__", include_str!("../../templates/library/src/index.ts__template__")),
    (
        "src/lib/__fileName__.ts__template__",
        include_str!("../../templates/library/src/lib/__fileName__.ts__template__"),
    ),
    (
        "src/lib/__fileName__.spec.ts__template__",
        include_str!("../../templates/library/src/lib/__fileName__.spec.ts__template__"),
    ),
];

/// Build tool used for the `build` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundler {
    #[default]
    Tsc,
    Swc,
    None,
}

impl Bundler {
    fn executor(self) -> Option<&'static str> {
        match self {
            Bundler::Tsc => Some("@nrwl/js:tsc"),
            Bundler::Swc => Some("@nrwl/js:swc"),
            Bundler::None => None,
        }
    }
}

/// Unit test runner wired into generated projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestRunner {
    #[default]
    Jest,
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOptions {
    pub name: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub import_path: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub publishable: bool,
    #[serde(default)]
    pub bundler: Bundler,
    #[serde(default)]
    pub unit_test_runner: TestRunner,
    #[serde(default)]
    pub root_project: bool,
}

/// Resolved names and locations of a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLibrary {
    pub project_name: String,
    pub project_directory: String,
    pub project_root: String,
    pub source_root: String,
    pub import_path: String,
    pub file_name: String,
}

/// Resolve project name, root and import path the same way for every step
/// that creates a library.
pub fn normalize(tree: &Tree<'_>, options: &LibraryOptions) -> Result<NormalizedLibrary> {
    let workspace = read_workspace(tree)?;
    let file_name = names(&options.name).file_name;

    let project_directory = match options.directory.as_deref() {
        Some(dir) if !dir.trim().is_empty() => {
            format!("{}/{}", names(dir.trim_matches('/')).file_name, file_name)
        }
        _ => file_name.clone(),
    };

    let (project_name, project_root) = if options.root_project {
        (file_name.clone(), ".".to_string())
    } else {
        (
            project_directory.replace('/', "-"),
            join_path_fragments(&[&workspace.workspace_layout.libs_dir, &project_directory])?,
        )
    };

    let import_path = options
        .import_path
        .clone()
        .unwrap_or_else(|| import_path(workspace.npm_scope.as_deref(), &project_directory));

    Ok(NormalizedLibrary {
        source_root: join_path_fragments(&[&project_root, "src"])?,
        project_name,
        project_directory,
        project_root,
        import_path,
        file_name,
    })
}

/// Creates a library project, its manifest and its sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryGenerator;

const FIELDS: &[Field] = &[
    Field::required("name", FieldKind::String),
    Field::optional("directory", FieldKind::String),
    Field::optional("importPath", FieldKind::String),
    Field::optional("tags", FieldKind::String),
    Field::optional("publishable", FieldKind::Boolean),
    Field::optional("bundler", FieldKind::OneOf(&["tsc", "swc", "none"])),
    Field::optional("unitTestRunner", FieldKind::OneOf(&["jest", "none"])),
    Field::optional("rootProject", FieldKind::Boolean),
];

impl Generator for LibraryGenerator {
    type Options = LibraryOptions;

    fn name(&self) -> &'static str {
        "library"
    }

    fn description(&self) -> &'static str {
        "Create a TypeScript library project"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "library",
            fields: FIELDS,
        }
    }

    fn validate(&self, _tree: &Tree<'_>, options: &LibraryOptions) -> Result<()> {
        if options.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: LibraryOptions) -> Result<Tasks> {
        let lib = normalize(tree, &options)?;

        add_project(tree, &lib.project_name, project_configuration(&lib, &options))?;

        let manifest_path = join_path_fragments(&[&lib.project_root, "package.json"])?;
        let import_path = lib.import_path.clone();
        update_json_or(
            tree,
            &manifest_path,
            json!({"name": import_path, "version": "0.0.1"}),
            |mut manifest| {
                manifest["name"] = Value::from(import_path.as_str());
                if manifest.get("version").is_none() {
                    manifest["version"] = Value::from("0.0.1");
                }
                Ok(manifest)
            },
        )?;

        let mut substitutions = name_substitutions(&options.name, &lib.project_root);
        substitutions.insert("projectName".to_string(), lib.project_name.clone());
        substitutions.insert("importPath".to_string(), lib.import_path.clone());
        generate_files(
            tree,
            &bundle(TEMPLATE)?,
            &lib.project_root,
            &substitutions,
            &MaterializeOptions::default(),
        )?;

        if options.unit_test_runner == TestRunner::None {
            for file in [
                format!("src/lib/{}.spec.ts", lib.file_name),
                "jest.config.ts".to_string(),
                "tsconfig.spec.json".to_string(),
            ] {
                tree.delete(&join_path_fragments(&[&lib.project_root, &file])?)?;
            }
        }

        let mut dependencies: Vec<(&str, &str)> = Vec::new();
        let mut dev_dependencies: Vec<(&str, &str)> = Vec::new();
        if options.bundler == Bundler::Swc {
            dependencies.push(("@swc/helpers", SWC_HELPERS_VERSION));
            dev_dependencies.push(("@swc/core", SWC_CORE_VERSION));
        }
        if options.unit_test_runner == TestRunner::Jest {
            dev_dependencies.extend([
                ("@nx/jest", NX_VERSION),
                ("jest", JEST_VERSION),
                ("ts-jest", TS_JEST_VERSION),
                ("@types/jest", JEST_TYPES_VERSION),
            ]);
        }

        if dependencies.is_empty() && dev_dependencies.is_empty() {
            return Ok(Tasks::new());
        }
        add_dependencies_to_package_json(tree, &dependencies, &dev_dependencies)
    }
}

fn project_configuration(lib: &NormalizedLibrary, options: &LibraryOptions) -> ProjectConfiguration {
    let in_root = |file: &str| {
        if lib.project_root == "." {
            file.to_string()
        } else {
            format!("{}/{}", lib.project_root, file)
        }
    };

    let mut targets = IndexMap::new();
    if let Some(executor) = options.bundler.executor() {
        let output_path = if lib.project_root == "." {
            format!("dist/{}", lib.project_name)
        } else {
            format!("dist/{}", lib.project_root)
        };

        let mut build_options = Map::new();
        build_options.insert("outputPath".to_string(), Value::from(output_path));
        build_options.insert("tsConfig".to_string(), Value::from(in_root("tsconfig.lib.json")));
        build_options.insert("main".to_string(), Value::from(in_root("src/index.ts")));
        build_options.insert("assets".to_string(), Value::Array(Vec::new()));

        targets.insert(
            "build".to_string(),
            TargetConfiguration {
                executor: executor.to_string(),
                outputs: vec!["{options.outputPath}".to_string()],
                options: build_options,
                ..Default::default()
            },
        );
    }

    if options.unit_test_runner == TestRunner::Jest {
        let mut test_options = Map::new();
        test_options.insert("jestConfig".to_string(), Value::from(in_root("jest.config.ts")));
        test_options.insert("passWithNoTests".to_string(), Value::Bool(true));

        targets.insert(
            "test".to_string(),
            TargetConfiguration {
                executor: "@nx/jest:jest".to_string(),
                outputs: vec!["{workspaceRoot}/coverage/{projectRoot}".to_string()],
                options: test_options,
                ..Default::default()
            },
        );
    }

    ProjectConfiguration {
        root: lib.project_root.clone(),
        source_root: Some(lib.source_root.clone()),
        project_type: Some(ProjectType::Library),
        targets,
        tags: parse_tags(options.tags.as_deref()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFS;
    use crate::generators::run;
    use crate::merge::json::read_json;
    use crate::registry::{read_project, WORKSPACE_FILE};

    fn options(name: &str) -> LibraryOptions {
        LibraryOptions {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_project_and_files() {
        let mut store = MemoryFS::new();
        let mut tree = Tree::new(&mut store);
        let tasks = run(&LibraryGenerator, &mut tree, options("my-lib")).unwrap();

        let project = read_project(&tree, "my-lib").unwrap();
        assert_eq!(project.root, "libs/my-lib");
        assert_eq!(project.source_root.as_deref(), Some("libs/my-lib/src"));
        assert_eq!(project.targets["build"].executor, "@nrwl/js:tsc");
        assert_eq!(project.targets["build"].options["main"], "libs/my-lib/src/index.ts");
        assert!(project.targets.contains_key("test"));

        assert_eq!(
            tree.read_to_string("libs/my-lib/src/index.ts").unwrap(),
            "export * from './lib/my-lib';\n"
        );
        assert!(tree.exists("libs/my-lib/src/lib/my-lib.spec.ts"));
        assert_eq!(read_json(&tree, "libs/my-lib/package.json").unwrap()["name"], "my-lib");
        assert_eq!(tasks.names(), vec!["npm install"]);
    }

    #[test]
    fn test_directory_and_scope() {
        let mut store = MemoryFS::new();
        store
            .add_file_string(WORKSPACE_FILE, r#"{"version": 2, "npmScope": "acme", "projects": {}}"#)
            .unwrap();
        let mut tree = Tree::new(&mut store);
        let opts = LibraryOptions {
            directory: Some("plugins".to_string()),
            tags: Some("scope:a,type:lib".to_string()),
            ..options("myLib")
        };
        run(&LibraryGenerator, &mut tree, opts).unwrap();

        let project = read_project(&tree, "plugins-my-lib").unwrap();
        assert_eq!(project.root, "libs/plugins/my-lib");
        assert_eq!(project.tags, vec!["scope:a", "type:lib"]);
        assert_eq!(
            read_json(&tree, "libs/plugins/my-lib/package.json").unwrap()["name"],
            "@acme/plugins/my-lib"
        );
    }

    #[test]
    fn test_unit_test_runner_none() {
        let mut store = MemoryFS::new();
        let mut tree = Tree::new(&mut store);
        let opts = LibraryOptions {
            unit_test_runner: TestRunner::None,
            ..options("my-lib")
        };
        let tasks = run(&LibraryGenerator, &mut tree, opts).unwrap();

        assert!(!tree.exists("libs/my-lib/src/lib/my-lib.spec.ts"));
        assert!(!tree.exists("libs/my-lib/jest.config.ts"));
        assert!(tree.exists("libs/my-lib/src/lib/my-lib.ts"));
        assert!(!read_project(&tree, "my-lib").unwrap().targets.contains_key("test"));
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_root_project_manifest_updated_in_place() {
        let mut store = MemoryFS::new();
        store
            .add_file_string("package.json", r#"{"name": "ws", "private": true}"#)
            .unwrap();
        let mut tree = Tree::new(&mut store);
        let opts = LibraryOptions {
            root_project: true,
            import_path: Some("@acme/tool".to_string()),
            ..options("tool")
        };
        run(&LibraryGenerator, &mut tree, opts).unwrap();

        let project = read_project(&tree, "tool").unwrap();
        assert_eq!(project.root, ".");
        assert_eq!(project.targets["build"].options["main"], "src/index.ts");
        assert_eq!(project.targets["build"].options["outputPath"], "dist/tool");

        let manifest = read_json(&tree, "package.json").unwrap();
        assert_eq!(manifest["name"], "@acme/tool");
        assert_eq!(manifest["private"], true);
    }

    #[test]
    fn test_swc_bundler() {
        let mut store = MemoryFS::new();
        let mut tree = Tree::new(&mut store);
        let opts = LibraryOptions {
            bundler: Bundler::Swc,
            unit_test_runner: TestRunner::None,
            ..options("fast")
        };
        let tasks = run(&LibraryGenerator, &mut tree, opts).unwrap();

        assert_eq!(read_project(&tree, "fast").unwrap().targets["build"].executor, "@nrwl/js:swc");
        let manifest = read_json(&tree, "package.json").unwrap();
        assert_eq!(manifest["dependencies"]["@swc/helpers"], SWC_HELPERS_VERSION);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_duplicate_library_fails_with_step_name() {
        let mut store = MemoryFS::new();
        let mut tree = Tree::new(&mut store);
        run(&LibraryGenerator, &mut tree, options("dup")).unwrap();

        let err = run(&LibraryGenerator, &mut tree, options("dup")).unwrap_err();
        assert_eq!(err.step_path(), vec!["library"]);
        assert!(matches!(err.root_cause(), Error::DuplicateProject { .. }));
    }
}
