//! In-memory fragment store for testing.
//!
//! Provides [`MemoryStore`] for unit testing without filesystem access.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::store::{FragmentStore, StorageError, normalize_path};

/// Backend identifier for error messages.
const BACKEND: &str = "Memory";

/// In-memory fragment store.
///
/// Paths are normalized before lookup, so `parts/../a.md` and `a.md`
/// address the same fragment.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use docco_storage::{FragmentStore, MemoryStore};
///
/// let store = MemoryStore::new()
///     .with_file("manual.md", "# Manual")
///     .with_file("parts/intro.md", "Hello");
///
/// assert_eq!(store.read(Path::new("parts/intro.md")).unwrap(), "Hello");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: PathBuf,
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(normalize_path(path.as_ref()), content.into());
        self
    }

    /// Current content of a file, if present.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(&normalize_path(path.as_ref()))
            .cloned()
    }
}

impl FragmentStore for MemoryStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        self.get(path)
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }

    fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        self.files
            .write()
            .unwrap()
            .insert(normalize_path(path), content.to_owned());
        Ok(())
    }

    fn list(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, StorageError> {
        let dir = normalize_path(dir);
        let files = self.files.read().unwrap();
        Ok(files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter(|p| p.extension().is_some_and(|e| e == extension))
            .cloned()
            .collect())
    }

    fn local_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }
}
