//! CLI error types.

use docco_config::ConfigError;
use docco_core::BuildError;
use docco_i18n::CatalogError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Validation(String),
}
