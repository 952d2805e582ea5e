//! Error types for directive expansion and language filtering.

use std::path::{Path, PathBuf};

use docco_storage::StorageError;

/// Error raised while expanding include directives.
///
/// Every variant names the fragment holding the offending directive and
/// the directive's line within that fragment.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// Include nesting went past the configured ceiling.
    #[error(
        "include depth limit ({limit}) exceeded including {} from {}:{line}",
        .target.display(), .path.display()
    )]
    RecursionLimitExceeded {
        path: PathBuf,
        line: usize,
        target: PathBuf,
        limit: usize,
    },

    /// A fragment includes itself, directly or through others.
    #[error("cyclic include at {}:{line}: {}", .path.display(), format_chain(.chain))]
    CyclicInclude {
        path: PathBuf,
        line: usize,
        /// Open fragments from the document down to the repeated one.
        chain: Vec<PathBuf>,
    },

    /// The include target does not exist.
    #[error("fragment not found: {} (included from {}:{line})", .target.display(), .path.display())]
    FragmentNotFound {
        path: PathBuf,
        line: usize,
        target: PathBuf,
    },

    /// Executable fragment refused because execution was explicitly denied.
    #[error(
        "execution denied for {} (included from {}:{line}); enable executable fragments to run it",
        .target.display(), .path.display()
    )]
    ExecutionDenied {
        path: PathBuf,
        line: usize,
        target: PathBuf,
    },

    /// Executable fragment failed, timed out, or could not be started.
    #[error("executing {} (included from {}:{line}) failed: {message}", .target.display(), .path.display())]
    ExecutionFailed {
        path: PathBuf,
        line: usize,
        target: PathBuf,
        message: String,
    },

    /// Expansion kept producing new directives after the last allowed pass.
    #[error("directive expansion did not settle after {passes} passes in {}", .path.display())]
    IterationLimitExceeded { path: PathBuf, passes: usize },

    /// The fragment exists but could not be read.
    #[error("reading {} (included from {}:{line}): {source}", .target.display(), .path.display())]
    Storage {
        path: PathBuf,
        line: usize,
        target: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl ExpandError {
    /// Fragment holding the offending directive.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RecursionLimitExceeded { path, .. }
            | Self::CyclicInclude { path, .. }
            | Self::FragmentNotFound { path, .. }
            | Self::ExecutionDenied { path, .. }
            | Self::ExecutionFailed { path, .. }
            | Self::IterationLimitExceeded { path, .. }
            | Self::Storage { path, .. } => path,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Error raised by the language filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Language markers are unbalanced or nested.
    #[error("malformed language block at line {line}: {reason}")]
    MalformedLanguageBlock { line: usize, reason: String },
}
