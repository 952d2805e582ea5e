//! Fragment kinds and kind-specific post-processing.

use std::collections::BTreeMap;
use std::path::Path;

/// How an included fragment is turned into document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// Markdown, inserted unchanged.
    Markdown,
    /// HTML/SVG markup. Lines are trimmed and blank runs collapsed, since
    /// the result is re-parsed as markdown and indentation would turn it
    /// into a literal block.
    Markup,
    /// A program run through `interpreter`; its stdout is inserted.
    Executable {
        /// Command used to run the fragment (program plus leading arguments).
        interpreter: Vec<String>,
    },
}

/// Extension to interpreter mapping for executable fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    commands: BTreeMap<String, Vec<String>>,
}

impl Default for Interpreters {
    fn default() -> Self {
        Self::new()
            .with("py", ["python3"])
            .with("sh", ["sh"])
    }
}

impl Interpreters {
    /// An empty mapping (no executable fragment kinds).
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register an interpreter command for an extension (without dot).
    #[must_use]
    pub fn with<I, S>(mut self, extension: &str, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(extension, command);
        self
    }

    /// Register an interpreter command for an extension (without dot).
    ///
    /// An empty command removes the mapping.
    pub fn insert<I, S>(&mut self, extension: &str, command: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command: Vec<String> = command.into_iter().map(Into::into).collect();
        let key = extension.to_ascii_lowercase();
        if command.is_empty() {
            self.commands.remove(&key);
        } else {
            self.commands.insert(key, command);
        }
    }

    /// Interpreter command for an extension.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&[String]> {
        self.commands
            .get(&extension.to_ascii_lowercase())
            .map(Vec::as_slice)
    }
}

impl FragmentKind {
    /// Classify a fragment by its file extension (case-insensitive).
    ///
    /// Returns `None` for extensions with no known kind; callers insert
    /// such fragments verbatim.
    #[must_use]
    pub fn from_path(path: &Path, interpreters: &Interpreters) -> Option<Self> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Some(Self::Markdown);
        };
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" | "svg" => Some(Self::Markup),
            other => interpreters.get(other).map(|cmd| Self::Executable {
                interpreter: cmd.to_vec(),
            }),
        }
    }

    /// Apply kind-specific post-processing to fragment text.
    ///
    /// Executable output is returned unchanged; it is post-processed by the
    /// runner.
    #[must_use]
    pub fn post_process(&self, text: String) -> String {
        match self {
            Self::Markdown | Self::Executable { .. } => text,
            Self::Markup => trim_markup(&text),
        }
    }
}

/// Trim every line and collapse runs of blank lines into one.
///
/// Leading and trailing blank lines are dropped.
fn trim_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(line);
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_kind_by_extension() {
        let interp = Interpreters::default();
        assert_eq!(
            FragmentKind::from_path(Path::new("a.md"), &interp),
            Some(FragmentKind::Markdown)
        );
        assert_eq!(
            FragmentKind::from_path(Path::new("dir/A.HTML"), &interp),
            Some(FragmentKind::Markup)
        );
        assert_eq!(
            FragmentKind::from_path(Path::new("table.py"), &interp),
            Some(FragmentKind::Executable {
                interpreter: vec!["python3".to_owned()]
            })
        );
        assert_eq!(
            FragmentKind::from_path(Path::new("README"), &interp),
            Some(FragmentKind::Markdown)
        );
        assert_eq!(FragmentKind::from_path(Path::new("data.csv"), &interp), None);
    }

    #[test]
    fn test_interpreters_without_executables() {
        let interp = Interpreters::new();
        assert_eq!(FragmentKind::from_path(Path::new("gen.py"), &interp), None);
    }

    #[test]
    fn test_interpreter_override_and_remove() {
        let mut interp = Interpreters::default().with("py", ["uv", "run"]);
        assert_eq!(
            interp.get("PY"),
            Some(["uv".to_owned(), "run".to_owned()].as_slice())
        );
        interp.insert("sh", Vec::<String>::new());
        assert_eq!(interp.get("sh"), None);
    }

    #[test]
    fn test_markdown_unchanged() {
        let text = "  indented\n\n\n\nkept  \n".to_owned();
        assert_eq!(FragmentKind::Markdown.post_process(text.clone()), text);
    }

    #[test]
    fn test_markup_trimmed_and_collapsed() {
        let text = "\n    <div>\n\n\n      <p>Hi</p>\n   \n    </div>\n\n".to_owned();
        assert_eq!(
            FragmentKind::Markup.post_process(text),
            "<div>\n\n<p>Hi</p>\n\n</div>"
        );
    }

    #[test]
    fn test_markup_keeps_single_blank_line() {
        let text = "<a>\n\n<b>".to_owned();
        assert_eq!(FragmentKind::Markup.post_process(text), "<a>\n\n<b>");
    }
}
