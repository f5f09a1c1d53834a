//! The staged workspace tree
//!
//! A [`Tree`] is an in-memory overlay over a [`BackingStore`]. Every read
//! falls through to the store unless the path has been written or deleted in
//! the overlay; every write or delete only touches the overlay. Nothing
//! reaches the store until [`Tree::commit`] is called, which consumes the
//! tree so a staged view can be flushed at most once.
//!
//! Each path is in one of three states:
//!
//! - untouched: not in the overlay, reads go to the store
//! - written: the overlay holds the full file
//! - deleted: reads fail with `NotFound` whatever the store holds
//!
//! Changes are kept in the order of their most recent mutation, which is
//! the order in which [`Tree::commit`] applies them.

use crate::error::{Error, Result};
use crate::filesystem::{BackingStore, File};
use crate::path::{join_path_fragments, normalize_path};
use indexmap::IndexMap;
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::Path;

/// A staged change for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Write(File),
    Delete,
}

/// Kind of a pending change, relative to the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    /// Uppercase label used in change listings.
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Create => "CREATE",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

/// A pending change as seen from outside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

/// What a successful flush applied to the backing store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: Vec<String>,
    pub deleted: Vec<String>,
}

impl FlushReport {
    /// Total number of paths touched on the store.
    pub fn len(&self) -> usize {
        self.written.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory staged view of a workspace over a backing store.
pub struct Tree<'s> {
    store: &'s mut dyn BackingStore,
    changes: IndexMap<String, Change>,
}

impl<'s> Tree<'s> {
    /// Create an empty overlay over `store`.
    pub fn new(store: &'s mut dyn BackingStore) -> Self {
        Self {
            store,
            changes: IndexMap::new(),
        }
    }

    /// The on-disk directory of the backing store, if it has one.
    pub fn root(&self) -> Option<&Path> {
        self.store.root()
    }

    /// Whether `path` exists as a file or as a directory with at least one
    /// live file below it.
    pub fn exists(&self, path: &str) -> bool {
        let Ok(path) = normalize_path(path) else {
            return false;
        };
        if path.is_empty() {
            return true;
        }
        self.is_normalized_file(&path) || self.has_live_file_below(&path)
    }

    /// Whether `path` exists as a file.
    pub fn is_file(&self, path: &str) -> bool {
        normalize_path(path)
            .map(|p| self.is_normalized_file(&p))
            .unwrap_or(false)
    }

    /// Read the bytes of a file.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(self.read_file(path)?.content)
    }

    /// Read a file including its permissions.
    pub fn read_file(&self, path: &str) -> Result<File> {
        let path = normalize_path(path)?;
        match self.changes.get(&path) {
            Some(Change::Write(file)) => Ok(file.clone()),
            Some(Change::Delete) => Err(Error::not_found("File", path)),
            None => self.store.read(&path),
        }
    }

    /// Read a file as UTF-8 text.
    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let content = self.read(path)?;
        String::from_utf8(content).map_err(|_| Error::Parse {
            path: path.to_string(),
            message: "File content is not valid UTF-8".to_string(),
        })
    }

    /// Create or replace a file. An existing file keeps its permissions.
    pub fn write(&mut self, path: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        let mut file = File::new(content.into());
        if let Ok(existing) = self.read_file(path) {
            file.permissions = existing.permissions;
        }
        self.write_file(path, file)
    }

    /// Replace the content of a staged write in place.
    ///
    /// Unlike [`Tree::write`], the path keeps its position in the flush order.
    pub fn replace_staged(&mut self, path: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        let path = normalize_path(path)?;
        match self.changes.get_mut(&path) {
            Some(Change::Write(file)) => {
                file.content = content.into();
                Ok(())
            }
            _ => Err(Error::not_found("Staged file", path)),
        }
    }

    /// Create or replace a file with explicit permissions.
    pub fn write_file(&mut self, path: &str, file: File) -> Result<()> {
        let path = normalize_path(path)?;
        if path.is_empty() {
            return Err(Error::Path {
                message: "cannot write to the workspace root".to_string(),
            });
        }
        debug!("Staging write: {} ({} bytes)", path, file.size());
        self.record(path, Change::Write(file));
        Ok(())
    }

    /// Delete a file, or every file below a directory.
    ///
    /// Deleting a path that does not exist is a no-op.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let normalized = normalize_path(path)?;
        if self.is_normalized_file(&normalized) {
            debug!("Staging delete: {}", normalized);
            self.record(normalized, Change::Delete);
            return Ok(());
        }

        let files = self.files_under(&normalized)?;
        if files.is_empty() {
            debug!("Nothing to delete at {}", normalized);
        }
        for file in files {
            debug!("Staging delete: {}", file);
            self.record(file, Change::Delete);
        }
        Ok(())
    }

    /// Move a file or every file below a directory to a new location.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;

        if self.is_normalized_file(&from) {
            let file = self.read_file(&from)?;
            self.record(from, Change::Delete);
            return self.write_file(&to, file);
        }

        let files = self.files_under(&from)?;
        if files.is_empty() {
            return Err(Error::not_found("Path", from));
        }
        for path in files {
            let file = self.read_file(&path)?;
            let relative = &path[from.len()..];
            let target = join_path_fragments(&[&to, relative])?;
            self.record(path, Change::Delete);
            self.write_file(&target, file)?;
        }
        Ok(())
    }

    /// Sorted names of the live entries directly below `path`.
    pub fn children(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize_path(path)?;
        let mut names: BTreeSet<String> = self.store.list(&dir)?.into_iter().collect();

        let prefix = dir_prefix(&dir);
        for (changed, change) in &self.changes {
            if let (Change::Write(_), Some(rest)) = (change, changed.strip_prefix(&prefix)) {
                if let Some(name) = rest.split('/').next() {
                    names.insert(name.to_string());
                }
            }
        }

        Ok(names
            .into_iter()
            .filter(|name| {
                let child = format!("{}{}", prefix, name);
                self.is_normalized_file(&child) || self.has_live_file_below(&child)
            })
            .collect())
    }

    /// Every live file at or below `path`, sorted.
    pub fn files_under(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize_path(path)?;
        let mut files = Vec::new();
        if !dir.is_empty() && self.is_normalized_file(&dir) {
            files.push(dir);
            return Ok(files);
        }
        self.collect_files(&dir, &mut files)?;
        Ok(files)
    }

    /// Pending changes in flush order, with no-op writes left out.
    pub fn changes(&self) -> Vec<FileChange> {
        self.changes
            .iter()
            .filter_map(|(path, change)| {
                let kind = match change {
                    Change::Write(file) => match self.store.read(path) {
                        Ok(existing) if existing == *file => return None,
                        Ok(_) => ChangeKind::Update,
                        Err(_) => ChangeKind::Create,
                    },
                    Change::Delete if self.store.is_file(path) => ChangeKind::Delete,
                    Change::Delete => return None,
                };
                Some(FileChange {
                    path: path.clone(),
                    kind,
                })
            })
            .collect()
    }

    /// Apply every pending change to the backing store.
    ///
    /// Changes are applied in the order of their most recent mutation. The
    /// first failing path stops the flush; changes applied before it stay on
    /// the store and are reported through `Error::Flush::applied`.
    pub fn commit(self) -> Result<FlushReport> {
        let pending = self.changes();
        let Tree { store, mut changes } = self;
        let mut report = FlushReport::default();

        for change in pending {
            let applied = report.len();
            let result = match changes.swap_remove(&change.path) {
                Some(Change::Write(file)) => store.write(&change.path, &file),
                Some(Change::Delete) => store.delete(&change.path),
                None => continue,
            };

            if let Err(e) = result {
                return Err(Error::Flush {
                    path: change.path,
                    message: e.to_string(),
                    applied,
                });
            }

            match change.kind {
                ChangeKind::Delete => report.deleted.push(change.path),
                ChangeKind::Create | ChangeKind::Update => report.written.push(change.path),
            }
        }

        info!(
            "Flushed {} written and {} deleted path(s)",
            report.written.len(),
            report.deleted.len()
        );
        Ok(report)
    }

    fn record(&mut self, path: String, change: Change) {
        // Re-inserting moves the path to the end of the flush order
        self.changes.shift_remove(&path);
        self.changes.insert(path, change);
    }

    fn is_normalized_file(&self, path: &str) -> bool {
        match self.changes.get(path) {
            Some(Change::Write(_)) => true,
            Some(Change::Delete) => false,
            None => self.store.is_file(path),
        }
    }

    fn has_live_file_below(&self, dir: &str) -> bool {
        let prefix = dir_prefix(dir);
        let staged = self
            .changes
            .iter()
            .any(|(path, change)| matches!(change, Change::Write(_)) && path.starts_with(&prefix));
        if staged {
            return true;
        }

        let Ok(entries) = self.store.list(dir) else {
            return false;
        };
        entries.into_iter().any(|name| {
            let child = format!("{}{}", prefix, name);
            if self.store.is_file(&child) {
                !matches!(self.changes.get(&child), Some(Change::Delete))
            } else {
                self.has_live_file_below(&child)
            }
        })
    }

    fn collect_files(&self, dir: &str, files: &mut Vec<String>) -> Result<()> {
        let prefix = dir_prefix(dir);
        for name in self.children(dir)? {
            let child = format!("{}{}", prefix, name);
            if self.is_normalized_file(&child) {
                files.push(child);
            } else {
                self.collect_files(&child, files)?;
            }
        }
        Ok(())
    }
}

fn dir_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}
