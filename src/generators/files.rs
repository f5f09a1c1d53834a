//! The `files` step: render an on-disk template directory into the workspace

use super::Generator;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::schema::{Field, FieldKind, OptionsSchema};
use crate::tasks::Tasks;
use crate::template::{generate_files, MaterializeOptions, Substitutions};
use crate::tree::Tree;
use log::info;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesOptions {
    /// Template directory, absolute or relative to the workspace root
    pub source: String,
    /// Destination directory inside the workspace
    pub destination: String,
    #[serde(default)]
    pub substitutions: Map<String, Value>,
    /// Globs of template files copied without rendering
    #[serde(default)]
    pub verbatim: Vec<String>,
}

/// Materializes a template directory from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesGenerator;

impl FilesGenerator {
    fn source_dir(tree: &Tree<'_>, source: &str) -> Result<PathBuf> {
        let path = Path::new(source);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        match tree.root() {
            Some(root) => Ok(root.join(path)),
            None => Err(Error::validation(
                "source",
                "a relative source needs a workspace directory",
            )),
        }
    }

    fn substitutions(options: &FilesOptions) -> Result<Substitutions> {
        options
            .substitutions
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key.clone(), s.clone())),
                other => Err(Error::validation(
                    format!("substitutions.{}", key),
                    format!("expected string, got {}", other),
                )),
            })
            .collect()
    }
}

const FIELDS: &[Field] = &[
    Field::required("source", FieldKind::String),
    Field::required("destination", FieldKind::String),
    Field::optional("substitutions", FieldKind::Object),
    Field::optional("verbatim", FieldKind::List),
];

impl Generator for FilesGenerator {
    type Options = FilesOptions;

    fn name(&self) -> &'static str {
        "files"
    }

    fn description(&self) -> &'static str {
        "Render a template directory from disk into the workspace"
    }

    fn schema(&self) -> OptionsSchema {
        OptionsSchema {
            generator: "files",
            fields: FIELDS,
        }
    }

    fn validate(&self, tree: &Tree<'_>, options: &FilesOptions) -> Result<()> {
        Self::substitutions(options)?;
        let source = Self::source_dir(tree, &options.source)?;
        if !source.is_dir() {
            return Err(Error::not_found("Directory", source.display().to_string()));
        }
        Ok(())
    }

    fn generate(&self, tree: &mut Tree<'_>, options: FilesOptions) -> Result<Tasks> {
        let source = Self::source_dir(tree, &options.source)?;
        let template = MemoryFS::load_dir(&source)?;
        let written = generate_files(
            tree,
            &template,
            &options.destination,
            &Self::substitutions(&options)?,
            &MaterializeOptions {
                verbatim: options.verbatim.clone(),
                preserve_existing: Vec::new(),
            },
        )?;

        info!(
            "Rendered {} file(s) from {} into {}",
            written.len(),
            source.display(),
            options.destination
        );
        Ok(Tasks::new())
    }
}
