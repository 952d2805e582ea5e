//! Build errors.

use std::path::PathBuf;

use docco_directives::{ExpandError, FilterError};
use docco_i18n::CatalogError;
use docco_renderer::RenderError;
use docco_storage::StorageError;

use crate::frontmatter::FrontmatterError;

/// Error that aborts a document build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("{}: {source}", .path.display())]
    Filter {
        path: PathBuf,
        #[source]
        source: FilterError,
    },

    /// A language block that spans fragment boundaries; `source` counts
    /// lines of the text with every include expanded.
    #[error("{}: {source} (line counted in the expanded text)", .path.display())]
    FilterExpanded {
        path: PathBuf,
        #[source]
        source: FilterError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    /// `multilingual: true` without `base_language`.
    #[error("{}: multilingual mode requires 'base_language' in frontmatter", .path.display())]
    MissingBaseLanguage { path: PathBuf },

    /// A stage failed for one language.
    #[error("building {lang}: {source}")]
    Language {
        lang: String,
        #[source]
        source: Box<BuildError>,
    },

    /// Writing an output file failed.
    #[error("writing {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn for_language(self, lang: &str) -> Self {
        match self {
            already @ Self::Language { .. } => already,
            other => Self::Language {
                lang: lang.to_owned(),
                source: Box::new(other),
            },
        }
    }
}
