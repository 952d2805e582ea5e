//! Build pipeline for docco documents.
//!
//! [`DocumentBuilder`] ties the stages together: frontmatter parsing,
//! directive expansion, language filtering, the translation workflow,
//! numbering, layout and rendering. Documents are read through a
//! [`FragmentStore`](docco_storage::FragmentStore) and rendered with a
//! [`RenderEngine`](docco_renderer::RenderEngine); outputs stay in memory
//! until [`Build::write`].
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use docco_core::DocumentBuilder;
//! use docco_renderer::HtmlEngine;
//! use docco_storage::MemoryStore;
//!
//! let store = MemoryStore::new().with_file("guide.md", "# Intro\n");
//! let build = DocumentBuilder::new(&store, &HtmlEngine)
//!     .build(Path::new("guide.md"), None)
//!     .unwrap();
//! assert_eq!(build.files[0].name, "guide.html");
//! ```

mod builder;
mod error;
pub mod frontmatter;
pub mod stylesheet;

pub use builder::{Build, BuildOptions, DocumentBuilder, OutputFile, Prepared};
pub use error::BuildError;
pub use frontmatter::{Frontmatter, FrontmatterError};

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(BuildError: Send, Sync, std::error::Error);
    assert_impl_all!(BuildOptions: Send, Sync, Clone);
    assert_impl_all!(Build: Send, Sync);
}
