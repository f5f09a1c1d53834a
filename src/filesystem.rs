//! Backing stores for the staged tree
//!
//! The staged tree ([`crate::tree::Tree`]) never touches storage until it is
//! committed. What it reads through to, and eventually flushes into, is a
//! [`BackingStore`]. Two implementations are provided:
//!
//! - [`DiskStore`]: a directory on the host filesystem.
//! - [`MemoryFS`]: an ordered in-memory file map. Besides serving as a store
//!   in tests and dry runs, it is also how template directories are
//!   represented (see [`crate::template`]).

use crate::error::{Error, Result};
use crate::path::normalize_path;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents a file with content and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// File permissions (simplified as u32)
    pub permissions: u32,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            permissions: 0o644, // Default permissions
        }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Storage the staged tree reads through to and flushes into.
///
/// All paths are normalized workspace-relative paths (see
/// [`crate::path::normalize_path`]); the empty string is the root.
pub trait BackingStore {
    /// Read a file. Missing files yield `Error::NotFound`.
    fn read(&self, path: &str) -> Result<File>;

    /// Whether a regular file exists at `path`.
    fn is_file(&self, path: &str) -> bool;

    /// Names of the direct children (files and directories) of `path`.
    ///
    /// Returns an empty list when `path` is not a directory.
    fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Create or replace a file, creating parent directories as needed.
    fn write(&mut self, path: &str, file: &File) -> Result<()>;

    /// Delete a file.
    fn delete(&mut self, path: &str) -> Result<()>;

    /// The on-disk directory this store is rooted at, if any.
    fn root(&self) -> Option<&Path> {
        None
    }
}

/// In-memory filesystem for fast file manipulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFS {
    /// Files stored as normalized path -> content mapping
    files: BTreeMap<String, File>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file below `dir` on disk, keyed by its path relative to `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::not_found("Directory", dir.display().to_string()));
        }

        let mut memfs = MemoryFS::new();
        for entry in walkdir::WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| Error::Filesystem {
                message: format!("Failed to walk '{}': {}", dir.display(), e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(dir).map_err(|e| Error::Path {
                message: format!("'{}': {}", entry.path().display(), e),
            })?;
            let mut file = File::new(fs::read(entry.path())?);
            file.permissions = read_permissions(entry.path());
            memfs.add_file(relative.to_string_lossy().as_ref(), file)?;
        }

        Ok(memfs)
    }

    /// Add or update a file
    pub fn add_file(&mut self, path: &str, file: File) -> Result<()> {
        self.files.insert(normalize_path(path)?, file);
        Ok(())
    }

    /// Add a file with content
    pub fn add_file_content(&mut self, path: &str, content: Vec<u8>) -> Result<()> {
        self.add_file(path, File::new(content))
    }

    /// Add a file with string content
    pub fn add_file_string(&mut self, path: &str, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file(&self, path: &str) -> Option<&File> {
        let key = normalize_path(path).ok()?;
        self.files.get(&key)
    }

    /// Get a file's content as UTF-8 text
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get_file(path)
            .and_then(|f| String::from_utf8(f.content.clone()).ok())
    }

    /// Remove a file
    pub fn remove_file(&mut self, path: &str) -> Result<Option<File>> {
        Ok(self.files.remove(&normalize_path(path)?))
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.get_file(path).is_some()
    }

    /// List all files in path order
    pub fn list_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, file) pairs in path order
    pub fn files(&self) -> impl Iterator<Item = (&String, &File)> {
        self.files.iter()
    }
}

impl BackingStore for MemoryFS {
    fn read(&self, path: &str) -> Result<File> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found("File", path))
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        let children: BTreeSet<String> = self
            .files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| key[prefix.len()..].split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(children.into_iter().collect())
    }

    fn write(&mut self, path: &str, file: &File) -> Result<()> {
        self.files.insert(path.to_string(), file.clone());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        self.files.remove(path);
        Ok(())
    }
}

/// A backing store rooted at a directory on the host filesystem.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl BackingStore for DiskStore {
    fn read(&self, path: &str) -> Result<File> {
        let full_path = self.full_path(path);
        if !full_path.is_file() {
            return Err(Error::not_found("File", path));
        }
        let mut file = File::new(fs::read(&full_path)?);
        file.permissions = read_permissions(&full_path);
        Ok(file)
    }

    fn is_file(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        let full_path = self.full_path(path);
        if !full_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&full_path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn write(&mut self, path: &str, file: &File) -> Result<()> {
        let full_path = self.full_path(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        fs::write(&full_path, &file.content).map_err(|e| Error::Filesystem {
            message: format!("Failed to write file '{}': {}", full_path.display(), e),
        })?;

        // Set permissions on Unix-like systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(file.permissions);
            fs::set_permissions(&full_path, perms).map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to set permissions on '{}': {}",
                    full_path.display(),
                    e
                ),
            })?;
        }

        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        fs::remove_file(&full_path).map_err(|e| Error::Filesystem {
            message: format!("Failed to delete '{}': {}", full_path.display(), e),
        })
    }

    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(unix)]
fn read_permissions(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn read_permissions(_path: &Path) -> u32 {
    0o644
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod memory_fs_tests {
        use super::*;

        #[test]
        fn test_add_and_get_normalizes_paths() {
            let mut fs = MemoryFS::new();
            fs.add_file_string("./src//main.ts", "main").unwrap();

            assert!(fs.exists("src/main.ts"));
            assert_eq!(fs.get_string("src/main.ts").unwrap(), "main");
            assert_eq!(fs.list_files(), vec!["src/main.ts".to_string()]);
        }

        #[test]
        fn test_list_children() {
            let mut fs = MemoryFS::new();
            fs.add_file_string("README.md", "# r").unwrap();
            fs.add_file_string("src/a.ts", "a").unwrap();
            fs.add_file_string("src/lib/b.ts", "b").unwrap();
            fs.add_file_string("srcx/c.ts", "c").unwrap();

            assert_eq!(fs.list("").unwrap(), vec!["README.md", "src", "srcx"]);
            assert_eq!(fs.list("src").unwrap(), vec!["a.ts", "lib"]);
            assert!(fs.list("README.md").unwrap().is_empty());
            assert!(fs.list("missing").unwrap().is_empty());
        }

        #[test]
        fn test_read_missing_is_not_found() {
            let fs = MemoryFS::new();
            assert!(matches!(fs.read("nope.txt"), Err(Error::NotFound { .. })));
        }

        #[test]
        fn test_remove_file() {
            let mut fs = MemoryFS::new();
            fs.add_file_string("a.txt", "a").unwrap();
            assert!(fs.remove_file("a.txt").unwrap().is_some());
            assert!(fs.is_empty());
        }
    }

    mod disk_store_tests {
        use super::*;

        #[test]
        fn test_write_creates_nested_directories() {
            let temp_dir = TempDir::new().unwrap();
            let mut store = DiskStore::new(temp_dir.path());

            store
                .write("src/utils/helper.ts", &File::from_string("export {}"))
                .unwrap();

            let written = temp_dir.path().join("src/utils/helper.ts");
            assert!(written.exists());
            assert_eq!(fs::read_to_string(written).unwrap(), "export {}");
            assert!(store.is_file("src/utils/helper.ts"));
        }

        #[test]
        fn test_read_and_list() {
            let temp_dir = TempDir::new().unwrap();
            fs::create_dir_all(temp_dir.path().join("libs/demo")).unwrap();
            fs::write(temp_dir.path().join("libs/demo/a.txt"), "A").unwrap();
            fs::write(temp_dir.path().join("package.json"), "{}").unwrap();

            let store = DiskStore::new(temp_dir.path());
            assert_eq!(store.read("libs/demo/a.txt").unwrap().content, b"A");
            assert_eq!(store.list("").unwrap(), vec!["libs", "package.json"]);
            assert_eq!(store.list("libs").unwrap(), vec!["demo"]);
            assert!(store.list("package.json").unwrap().is_empty());
            assert!(matches!(
                store.read("libs/demo"),
                Err(Error::NotFound { .. })
            ));
        }

        #[test]
        fn test_delete_file() {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("gone.txt"), "x").unwrap();

            let mut store = DiskStore::new(temp_dir.path());
            store.delete("gone.txt").unwrap();
            assert!(!temp_dir.path().join("gone.txt").exists());
            assert!(store.delete("gone.txt").is_err());
        }

        #[test]
        #[cfg(unix)]
        fn test_write_preserves_permissions() {
            use std::os::unix::fs::PermissionsExt;

            let temp_dir = TempDir::new().unwrap();
            let mut store = DiskStore::new(temp_dir.path());
            let mut file = File::from_string("#!/bin/sh\n");
            file.permissions = 0o755;
            store.write("bin/run.sh", &file).unwrap();

            let mode = fs::metadata(temp_dir.path().join("bin/run.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
            assert_eq!(store.read("bin/run.sh").unwrap().permissions, 0o755);
        }

        #[test]
        fn test_load_dir_into_memory() {
            let temp_dir = TempDir::new().unwrap();
            fs::create_dir_all(temp_dir.path().join("files/src")).unwrap();
            fs::write(temp_dir.path().join("files/src/index.ts__template__"), "x").unwrap();
            fs::write(temp_dir.path().join("files/README.md"), "r").unwrap();

            let memfs = MemoryFS::load_dir(&temp_dir.path().join("files")).unwrap();
            assert_eq!(
                memfs.list_files(),
                vec!["README.md".to_string(), "src/index.ts__template__".to_string()]
            );
        }

        #[test]
        fn test_load_dir_missing_directory() {
            let temp_dir = TempDir::new().unwrap();
            let result = MemoryFS::load_dir(&temp_dir.path().join("missing"));
            assert!(matches!(result, Err(Error::NotFound { .. })));
        }
    }
}
