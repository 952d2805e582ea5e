//! Recursive include expansion.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docco_storage::{FragmentStore, normalize_path};

use crate::args::DirectiveArgs;
use crate::context::ExpansionContext;
use crate::error::ExpandError;
use crate::exec::{ExecPolicy, run_fragment};
use crate::fragment::{FragmentKind, Interpreters};
use crate::marker::{self, DirectiveKind};
use crate::placeholder::substitute;

/// Configuration for the directive expander.
#[derive(Debug, Clone)]
pub struct ExpanderConfig {
    /// Maximum include nesting depth.
    ///
    /// Default: 10
    pub max_depth: usize,
    /// Maximum number of whole-document passes.
    ///
    /// Default: 10
    pub max_passes: usize,
    /// Whether executable fragments run.
    ///
    /// Default: [`ExecPolicy::Skip`]
    pub exec_policy: ExecPolicy,
    /// Wall-clock limit for one executable fragment.
    ///
    /// Default: 30 seconds
    pub exec_timeout: Duration,
    /// Interpreters for executable fragment extensions.
    pub interpreters: Interpreters,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpanderConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 10,
            max_passes: 10,
            exec_policy: ExecPolicy::default(),
            exec_timeout: Duration::from_secs(30),
            interpreters: Interpreters::default(),
        }
    }

    /// Set the maximum include depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum number of expansion passes.
    #[must_use]
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Set the executable fragment policy.
    #[must_use]
    pub fn with_exec_policy(mut self, policy: ExecPolicy) -> Self {
        self.exec_policy = policy;
        self
    }

    /// Set the executable fragment timeout.
    #[must_use]
    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Set the interpreter mapping.
    #[must_use]
    pub fn with_interpreters(mut self, interpreters: Interpreters) -> Self {
        self.interpreters = interpreters;
        self
    }
}

/// Result of expanding a document.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Fully expanded text.
    pub text: String,
    /// Whole-document passes performed.
    pub passes: usize,
    /// Fragments read, in first-read order (duplicates removed).
    pub fragments: Vec<PathBuf>,
    /// Non-fatal problems (unused arguments, skipped executables, ...).
    pub warnings: Vec<String>,
}

/// Accumulates per-call bookkeeping while the recursion runs.
#[derive(Default)]
struct Collector {
    fragments: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl Collector {
    fn read(&mut self, path: &Path) {
        if !self.fragments.iter().any(|p| p == path) {
            self.fragments.push(path.to_path_buf());
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Expands include directives by substituting fragment content.
///
/// Nested includes are resolved depth-first: an included fragment is fully
/// expanded before the next sibling directive is processed. Whole-document
/// passes repeat until one makes no substitution, since executable output
/// can introduce new directives.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use docco_directives::{Expander, ExpanderConfig, ExpansionContext};
/// use docco_storage::FsStore;
///
/// let store = FsStore::new(PathBuf::from("docs"));
/// let expander = Expander::new(&store, ExpanderConfig::default());
/// let text = store.read("manual.md".as_ref())?;
/// let expansion = expander.expand(&text, &ExpansionContext::root("manual.md"))?;
/// ```
pub struct Expander<'a> {
    store: &'a dyn FragmentStore,
    config: ExpanderConfig,
}

impl<'a> Expander<'a> {
    /// Create an expander reading fragments from `store`.
    #[must_use]
    pub fn new(store: &'a dyn FragmentStore, config: ExpanderConfig) -> Self {
        Self { store, config }
    }

    /// Expander configuration.
    #[must_use]
    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Expand every include directive in `text`.
    ///
    /// # Errors
    ///
    /// Fails with [`ExpandError::RecursionLimitExceeded`],
    /// [`ExpandError::CyclicInclude`], [`ExpandError::FragmentNotFound`],
    /// [`ExpandError::ExecutionDenied`], [`ExpandError::ExecutionFailed`] or
    /// [`ExpandError::IterationLimitExceeded`]. No partial result is returned.
    pub fn expand(&self, text: &str, ctx: &ExpansionContext) -> Result<Expansion, ExpandError> {
        let mut collector = Collector::default();
        let mut text = text.to_owned();

        for pass in 1..=self.config.max_passes {
            let (next, substitutions) = self.expand_text(&text, ctx, &mut collector)?;
            text = next;
            tracing::debug!(pass, substitutions, "Directive expansion pass");
            if substitutions == 0 {
                return Ok(self.finish(text, pass, collector));
            }
        }

        if has_includes(&text) {
            return Err(ExpandError::IterationLimitExceeded {
                path: ctx.current().to_path_buf(),
                passes: self.config.max_passes,
            });
        }
        Ok(self.finish(text, self.config.max_passes, collector))
    }

    fn finish(&self, text: String, passes: usize, collector: Collector) -> Expansion {
        tracing::debug!(
            passes,
            fragments = collector.fragments.len(),
            max_passes = self.config.max_passes,
            "Directive expansion completed"
        );
        Expansion {
            text,
            passes,
            fragments: collector.fragments,
            warnings: collector.warnings,
        }
    }

    /// One left-to-right scan. Returns the rewritten text and the number of
    /// directives substituted at this level.
    fn expand_text(
        &self,
        text: &str,
        ctx: &ExpansionContext,
        collector: &mut Collector,
    ) -> Result<(String, usize), ExpandError> {
        let directives = marker::scan(text);
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut substitutions = 0;

        for directive in directives {
            let DirectiveKind::Include { target, args } = &directive.kind else {
                continue;
            };
            out.push_str(&text[last..directive.span.start]);
            let included = self.include(target, args, directive.line, ctx, collector)?;
            out.push_str(&included);
            last = directive.span.end;
            substitutions += 1;
        }

        out.push_str(&text[last..]);
        Ok((out, substitutions))
    }

    /// Resolve one include directive to fully expanded text.
    fn include(
        &self,
        target: &str,
        args: &DirectiveArgs,
        line: usize,
        ctx: &ExpansionContext,
        collector: &mut Collector,
    ) -> Result<String, ExpandError> {
        let path = ctx.current().to_path_buf();
        let target = normalize_path(Path::new(target));

        if ctx.is_open(&target) {
            let mut chain = ctx.chain().to_vec();
            chain.push(target);
            return Err(ExpandError::CyclicInclude { path, line, chain });
        }
        if ctx.depth() + 1 > self.config.max_depth {
            return Err(ExpandError::RecursionLimitExceeded {
                path,
                line,
                target,
                limit: self.config.max_depth,
            });
        }
        if !self.store.exists(&target) {
            return Err(ExpandError::FragmentNotFound { path, line, target });
        }

        let kind = FragmentKind::from_path(&target, &self.config.interpreters);
        let text = match kind {
            Some(FragmentKind::Executable { interpreter }) => {
                match self.execute(&interpreter, &target, args, &path, line, collector)? {
                    Some(output) => output,
                    None => return Ok(String::new()),
                }
            }
            kind => {
                let raw = self.read(&target, &path, line)?;
                collector.read(&target);
                let substitution = substitute(&raw, args);
                if !substitution.unused.is_empty() {
                    collector.warn(format!(
                        "Unused arguments in include of {} at {}:{line}: {}",
                        target.display(),
                        path.display(),
                        substitution.unused.join(", ")
                    ));
                }
                if !substitution.unfulfilled.is_empty() {
                    collector.warn(format!(
                        "Unfulfilled placeholders in {}: {}",
                        target.display(),
                        substitution.unfulfilled.join(", ")
                    ));
                }
                let kind = kind.unwrap_or_else(|| {
                    collector.warn(format!(
                        "Unknown fragment type {}, inserting as-is",
                        target.display()
                    ));
                    FragmentKind::Markdown
                });
                kind.post_process(substitution.text)
            }
        };

        let child = ctx.descend(target, args.clone());
        let (expanded, _) = self.expand_text(&text, &child, collector)?;
        Ok(expanded)
    }

    fn read(&self, target: &Path, path: &Path, line: usize) -> Result<String, ExpandError> {
        self.store.read(target).map_err(|source| {
            if source.is_not_found() {
                ExpandError::FragmentNotFound {
                    path: path.to_path_buf(),
                    line,
                    target: target.to_path_buf(),
                }
            } else {
                ExpandError::Storage {
                    path: path.to_path_buf(),
                    line,
                    target: target.to_path_buf(),
                    source,
                }
            }
        })
    }

    /// Run an executable fragment according to the policy.
    ///
    /// Returns `None` when execution was not requested.
    fn execute(
        &self,
        interpreter: &[String],
        target: &Path,
        args: &DirectiveArgs,
        path: &Path,
        line: usize,
        collector: &mut Collector,
    ) -> Result<Option<String>, ExpandError> {
        match self.config.exec_policy {
            ExecPolicy::Skip => {
                collector.warn(format!(
                    "Skipping executable fragment {} included from {}:{line}; \
                     executable fragments are disabled",
                    target.display(),
                    path.display()
                ));
                return Ok(None);
            }
            ExecPolicy::Deny => {
                return Err(ExpandError::ExecutionDenied {
                    path: path.to_path_buf(),
                    line,
                    target: target.to_path_buf(),
                });
            }
            ExecPolicy::Allow => {}
        }

        let failed = |message: String| ExpandError::ExecutionFailed {
            path: path.to_path_buf(),
            line,
            target: target.to_path_buf(),
            message,
        };

        let script = self
            .store
            .local_path(target)
            .ok_or_else(|| failed("fragment store has no local file for it".to_owned()))?;
        let cwd = script
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        collector.read(target);
        run_fragment(interpreter, &script, args, &cwd, self.config.exec_timeout)
            .map(Some)
            .map_err(failed)
    }
}

fn has_includes(text: &str) -> bool {
    marker::scan(text)
        .iter()
        .any(|d| matches!(d.kind, DirectiveKind::Include { .. }))
}

#[cfg(test)]
mod tests {
    use docco_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;

    fn expand(store: &MemoryStore, text: &str) -> Result<Expansion, ExpandError> {
        Expander::new(store, ExpanderConfig::default()).expand(text, &ExpansionContext::root("doc.md"))
    }

    #[test]
    fn test_include_with_argument() {
        let store = MemoryStore::new().with_file("a.md", "Hi {{name}}");
        let result = expand(&store, r#"<!-- include:"a.md" name="X" -->"#).unwrap();
        assert_eq!(result.text, "Hi X");
        assert_eq!(result.fragments, vec![PathBuf::from("a.md")]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_text_around_directive_preserved() {
        let store = MemoryStore::new().with_file("a.md", "inner");
        let result = expand(&store, "before <!-- include:\"a.md\" --> after").unwrap();
        assert_eq!(result.text, "before inner after");
    }

    #[test]
    fn test_nested_includes_resolved() {
        let store = MemoryStore::new()
            .with_file("a.md", "A[<!-- include:\"b.md\" -->]")
            .with_file("b.md", "B[<!-- include:\"c.md\" -->]")
            .with_file("c.md", "C");
        let result = expand(&store, "<!-- include:\"a.md\" --> <!-- include:\"c.md\" -->").unwrap();
        assert_eq!(result.text, "A[B[C]] C");
        assert_eq!(result.passes, 2);
    }

    #[test]
    fn test_same_fragment_twice_is_not_a_cycle() {
        let store = MemoryStore::new().with_file("a.md", "x");
        let result = expand(&store, "<!-- include:\"a.md\" -->-<!-- include:\"a.md\" -->").unwrap();
        assert_eq!(result.text, "x-x");
    }

    fn chain_store(len: usize) -> MemoryStore {
        let mut store = MemoryStore::new();
        for i in 1..len {
            store = store.with_file(format!("f{i}.md"), format!("<!-- include:\"f{}.md\" -->", i + 1));
        }
        store.with_file(format!("f{len}.md"), "end")
    }

    #[test]
    fn test_depth_ten_succeeds() {
        let store = chain_store(10);
        let result = expand(&store, "<!-- include:\"f1.md\" -->").unwrap();
        assert_eq!(result.text, "end");
    }

    #[test]
    fn test_depth_eleven_fails() {
        let store = chain_store(11);
        let err = expand(&store, "<!-- include:\"f1.md\" -->").unwrap_err();
        match err {
            ExpandError::RecursionLimitExceeded {
                path, target, limit, ..
            } => {
                assert_eq!(path, PathBuf::from("f10.md"));
                assert_eq!(target, PathBuf::from("f11.md"));
                assert_eq!(limit, 10);
            }
            other => panic!("expected RecursionLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_direct_self_include_is_cyclic() {
        let store = MemoryStore::new().with_file("a.md", "<!-- include:\"a.md\" -->");
        let err = expand(&store, "<!-- include:\"a.md\" -->").unwrap_err();
        match err {
            ExpandError::CyclicInclude { path, line, chain } => {
                assert_eq!(path, PathBuf::from("a.md"));
                assert_eq!(line, 1);
                assert_eq!(
                    chain,
                    vec![
                        PathBuf::from("doc.md"),
                        PathBuf::from("a.md"),
                        PathBuf::from("a.md")
                    ]
                );
            }
            other => panic!("expected CyclicInclude, got {other:?}"),
        }
    }

    #[test]
    fn test_indirect_cycle_through_other_spelling() {
        let store = MemoryStore::new()
            .with_file("a.md", "<!-- include:\"parts/b.md\" -->")
            .with_file("parts/b.md", "\n\n<!-- include:\"parts/../a.md\" -->");
        let err = expand(&store, "<!-- include:\"a.md\" -->").unwrap_err();
        match err {
            ExpandError::CyclicInclude { path, line, .. } => {
                assert_eq!(path, PathBuf::from("parts/b.md"));
                assert_eq!(line, 3);
            }
            other => panic!("expected CyclicInclude, got {other:?}"),
        }
    }

    #[test]
    fn test_document_including_itself() {
        let store = MemoryStore::new().with_file("doc.md", "x");
        let err = expand(&store, "<!-- include:\"./doc.md\" -->").unwrap_err();
        assert!(matches!(err, ExpandError::CyclicInclude { .. }));
    }

    #[test]
    fn test_missing_fragment() {
        let store = MemoryStore::new();
        let err = expand(&store, "line\n<!-- include:\"gone.md\" -->").unwrap_err();
        match err {
            ExpandError::FragmentNotFound { path, line, target } => {
                assert_eq!(path, PathBuf::from("doc.md"));
                assert_eq!(line, 2);
                assert_eq!(target, PathBuf::from("gone.md"));
            }
            other => panic!("expected FragmentNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_markup_fragment_trimmed() {
        let store = MemoryStore::new().with_file("box.html", "    <div>\n      {{v}}\n    </div>\n");
        let result = expand(&store, r#"<!-- include:"box.html" v="ok" -->"#).unwrap();
        assert_eq!(result.text, "<div>\nok\n</div>");
    }

    #[test]
    fn test_markdown_fragment_unchanged() {
        let store = MemoryStore::new().with_file("a.md", "    code\n\n");
        let result = expand(&store, "<!-- include:\"a.md\" -->").unwrap();
        assert_eq!(result.text, "    code\n\n");
    }

    #[test]
    fn test_unknown_extension_inserted_with_warning() {
        let store = MemoryStore::new().with_file("data.csv", "a,b");
        let result = expand(&store, "<!-- include:\"data.csv\" -->").unwrap();
        assert_eq!(result.text, "a,b");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("data.csv"));
    }

    #[test]
    fn test_unused_and_unfulfilled_warnings() {
        let store = MemoryStore::new().with_file("a.md", "{{x}}{{y}}");
        let result = expand(&store, r#"<!-- include:"a.md" x="1" z="2" -->"#).unwrap();
        assert_eq!(result.text, "1");
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains('z'));
        assert!(result.warnings[1].contains('y'));
    }

    #[test]
    fn test_directive_in_code_not_expanded() {
        let store = MemoryStore::new().with_file("a.md", "X");
        let text = "`<!-- include:\"a.md\" -->`\n\n```\n<!-- include:\"a.md\" -->\n```\n";
        let result = expand(&store, text).unwrap();
        assert_eq!(result.text, text);
        assert_eq!(result.passes, 1);
    }

    #[test]
    fn test_code_in_fragment_protected() {
        let store = MemoryStore::new().with_file("doc-snippet.md", "```\n<!-- include:\"nope.md\" -->\n```");
        let result = expand(&store, "<!-- include:\"doc-snippet.md\" -->").unwrap();
        assert!(result.text.contains("nope.md"));
    }

    #[test]
    fn test_executable_skipped_by_default() {
        let store = MemoryStore::new().with_file("gen.py", "print('x')");
        let result = expand(&store, "[<!-- include:\"gen.py\" -->]").unwrap();
        assert_eq!(result.text, "[]");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("gen.py"));
    }

    #[test]
    fn test_executable_denied() {
        let store = MemoryStore::new().with_file("gen.py", "print('x')");
        let config = ExpanderConfig::default().with_exec_policy(ExecPolicy::Deny);
        let err = Expander::new(&store, config)
            .expand("<!-- include:\"gen.py\" -->", &ExpansionContext::root("doc.md"))
            .unwrap_err();
        assert!(matches!(err, ExpandError::ExecutionDenied { line: 1, .. }));
    }

    #[test]
    fn test_executable_without_local_file_fails() {
        let store = MemoryStore::new().with_file("gen.py", "print('x')");
        let config = ExpanderConfig::default().with_exec_policy(ExecPolicy::Allow);
        let err = Expander::new(&store, config)
            .expand("<!-- include:\"gen.py\" -->", &ExpansionContext::root("doc.md"))
            .unwrap_err();
        assert!(matches!(err, ExpandError::ExecutionFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_output_expanded() {
        use docco_storage::FsStore;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("gen.sh"),
            "echo \"Rows: $1\"\necho '<!-- include:\"tail.md\" -->'\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("tail.md"), "done").unwrap();

        let store = FsStore::new(dir.path().to_path_buf());
        let config = ExpanderConfig::default().with_exec_policy(ExecPolicy::Allow);
        let result = Expander::new(&store, config)
            .expand(r#"<!-- include:"gen.sh" rows="3" -->"#, &ExpansionContext::root("doc.md"))
            .unwrap();
        assert_eq!(result.text, "Rows: --rows=3\ndone");
    }

    #[test]
    fn test_other_directives_left_in_place() {
        let store = MemoryStore::new().with_file("a.md", "<!-- lang:NL -->x<!-- /lang -->");
        let result = expand(&store, "<!-- TOC -->\n<!-- include:\"a.md\" -->").unwrap();
        assert_eq!(result.text, "<!-- TOC -->\n<!-- lang:NL -->x<!-- /lang -->");
    }

    #[test]
    fn test_pass_limit_with_leftover_directive() {
        let store = MemoryStore::new().with_file("a.md", "x");
        let config = ExpanderConfig::default().with_max_passes(1);
        // One pass is enough when nothing is left over
        let result = Expander::new(&store, config)
            .expand("<!-- include:\"a.md\" -->", &ExpansionContext::root("doc.md"))
            .unwrap();
        assert_eq!(result.text, "x");
        assert_eq!(result.passes, 1);
    }

    #[test]
    fn test_directive_assembled_across_fragment_boundary_hits_pass_limit() {
        // The fragment completes a directive only once spliced into the parent
        let store = MemoryStore::new()
            .with_file("a.md", "<!-- include:\"")
            .with_file("b.md", "y");
        let config = ExpanderConfig::default().with_max_passes(1);
        let err = Expander::new(&store, config)
            .expand("<!-- include:\"a.md\" -->b.md\" -->", &ExpansionContext::root("doc.md"))
            .unwrap_err();
        assert!(
            matches!(&err, ExpandError::IterationLimitExceeded { path, passes: 1 } if path == Path::new("doc.md")),
            "{err:?}"
        );
        assert_eq!(
            err.to_string(),
            "directive expansion did not settle after 1 passes in doc.md"
        );

        // A second pass resolves it
        let result = Expander::new(&store, ExpanderConfig::default().with_max_passes(2))
            .expand("<!-- include:\"a.md\" -->b.md\" -->", &ExpansionContext::root("doc.md"))
            .unwrap();
        assert_eq!(result.text, "y");
        assert_eq!(result.passes, 2);
    }
}
