//! Fragment storage for the docco document pipeline.
//!
//! This crate provides a [`FragmentStore`] trait for reading source fragments
//! (documents, includes, stylesheets) and persisting translation catalogs.
//! This enables:
//!
//! - **Unit testing** the pipeline without touching the real filesystem
//! - **Atomic persistence** of catalogs (write to a temporary file, then rename)
//!
//! # Architecture
//!
//! The crate provides:
//! - [`FragmentStore`] trait with `read()`, `exists()`, `write()` and `list()` methods
//! - [`FsStore`] implementation rooted at a document directory
//! - [`MemoryStore`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::{Path, PathBuf};
//! use docco_storage::{FragmentStore, FsStore};
//!
//! let store = FsStore::new(PathBuf::from("docs"));
//! let body = store.read(Path::new("manual.md"))?;
//! ```

mod fs;
#[cfg(feature = "mock")]
mod memory;
mod store;

pub use fs::FsStore;
#[cfg(feature = "mock")]
pub use memory::MemoryStore;
pub use store::{FragmentStore, StorageError, StorageErrorKind, normalize_path};
