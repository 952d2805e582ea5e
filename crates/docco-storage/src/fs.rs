//! Filesystem fragment store.
//!
//! Provides [`FsStore`] for reading fragments from the local filesystem and
//! writing catalogs atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::store::{FragmentStore, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem fragment store rooted at a document directory.
///
/// # Example
///
/// ```ignore
/// use std::path::{Path, PathBuf};
/// use docco_storage::{FragmentStore, FsStore};
///
/// let store = FsStore::new(PathBuf::from("docs"));
/// let text = store.read(Path::new("parts/intro.md"))?;
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store resolving relative paths against `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn error(err: std::io::Error, path: &Path) -> StorageError {
        StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
    }
}

impl FragmentStore for FsStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        let full = self.resolve(path);
        if full.is_dir() {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        fs::read_to_string(&full).map_err(|e| Self::error(e, path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        let parent = full
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        fs::create_dir_all(&parent).map_err(|e| Self::error(e, path))?;

        // Temp file in the target directory so the rename never crosses filesystems
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| Self::error(e, path))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Self::error(e, path))?;
        tmp.persist(&full).map_err(|e| Self::error(e.error, path))?;

        tracing::debug!(path = %full.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }

    fn list(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, StorageError> {
        let pattern = Pattern::new(&format!("*.{extension}")).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(dir)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let full = self.resolve(dir);
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::error(e, dir)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::error(e, dir))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if pattern.matches(name) {
                paths.push(dir.join(name));
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn local_path(&self, path: &Path) -> Option<PathBuf> {
        let full = self.resolve(path);
        Some(fs::canonicalize(&full).unwrap_or(full))
    }
}
