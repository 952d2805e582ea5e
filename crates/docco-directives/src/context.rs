//! Expansion context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::args::DirectiveArgs;

/// Immutable state for one level of include expansion.
///
/// A child context is derived with [`descend`](Self::descend) for every
/// nested include; the parent is never mutated, so sibling includes and
/// concurrent builds never observe each other's state.
#[derive(Debug, Clone)]
pub struct ExpansionContext {
    depth: usize,
    /// Fragments currently open, outermost first.
    open: Arc<[PathBuf]>,
    args: DirectiveArgs,
}

impl ExpansionContext {
    /// Context for the top-level document at `path`.
    #[must_use]
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            depth: 0,
            open: Arc::from(vec![path.into()]),
            args: DirectiveArgs::default(),
        }
    }

    /// Current include depth (0 for the top-level document).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Path of the fragment being expanded.
    #[must_use]
    pub fn current(&self) -> &Path {
        // The chain always holds at least the root document
        self.open.last().map_or(Path::new(""), PathBuf::as_path)
    }

    /// Chain of open fragments, outermost first.
    #[must_use]
    pub fn chain(&self) -> &[PathBuf] {
        &self.open
    }

    /// Arguments the current fragment was included with.
    #[must_use]
    pub fn args(&self) -> &DirectiveArgs {
        &self.args
    }

    /// Whether `path` is already open in this chain.
    #[must_use]
    pub fn is_open(&self, path: &Path) -> bool {
        self.open.iter().any(|p| p == path)
    }

    /// Derive the context for an included fragment.
    #[must_use]
    pub fn descend(&self, path: PathBuf, args: DirectiveArgs) -> Self {
        let mut open = self.open.to_vec();
        open.push(path);
        Self {
            depth: self.depth + 1,
            open: Arc::from(open),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_context() {
        let ctx = ExpansionContext::root("doc.md");
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.current(), Path::new("doc.md"));
        assert!(ctx.args().is_empty());
    }

    #[test]
    fn test_descend_leaves_parent_untouched() {
        let root = ExpansionContext::root("doc.md");
        let child = root.descend(PathBuf::from("a.md"), DirectiveArgs::parse("x=1"));

        assert_eq!(root.depth(), 0);
        assert_eq!(root.chain().len(), 1);
        assert_eq!(child.depth(), 1);
        assert_eq!(child.current(), Path::new("a.md"));
        assert_eq!(child.args().get("x"), Some("1"));
        assert!(child.is_open(Path::new("doc.md")));
        assert!(!root.is_open(Path::new("a.md")));
    }
}
