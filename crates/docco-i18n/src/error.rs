//! Catalog errors.

use std::path::PathBuf;

use docco_storage::StorageError;

/// Error reading or writing a translation catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog is not valid PO/POT text.
    #[error("malformed catalog {}:{line}: {message}", .path.display())]
    MalformedCatalog {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Reading or writing the catalog file failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
