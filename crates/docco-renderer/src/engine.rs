//! Render engines: markup plus stylesheet to an output document.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::RenderError;
use crate::markup::Markup;
use crate::util::escape_html;

/// Styles applied to a rendered document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// CSS embedded in a `<style>` element.
    pub inline: String,
    /// Stylesheet URLs referenced with `<link>` elements.
    pub external: Vec<String>,
}

/// Turns final markup into an output document.
pub trait RenderEngine: Send + Sync {
    /// Render `markup` styled with `stylesheet`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] with the engine's own failure message.
    fn render(&self, markup: &Markup, stylesheet: &Stylesheet) -> Result<Vec<u8>, RenderError>;

    /// File extension of the produced documents, without the dot.
    fn extension(&self) -> &str;
}

/// Wrap a body in a complete HTML document.
#[must_use]
pub fn wrap_html(body: &str, stylesheet: &Stylesheet) -> String {
    let links: String = stylesheet
        .external
        .iter()
        .map(|url| format!("<link rel=\"stylesheet\" href=\"{}\">\n", escape_html(url)))
        .collect();
    let style = if stylesheet.inline.is_empty() {
        String::new()
    } else {
        format!("<style>\n{}\n</style>\n", stylesheet.inline)
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n{links}{style}</head>\n<body>\n{body}\n</body>\n</html>"
    )
}

/// Produces standalone HTML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEngine;

impl RenderEngine for HtmlEngine {
    fn render(&self, markup: &Markup, stylesheet: &Stylesheet) -> Result<Vec<u8>, RenderError> {
        Ok(wrap_html(&markup.to_html(), stylesheet).into_bytes())
    }

    fn extension(&self) -> &str {
        "html"
    }
}

/// Pipes the HTML document through an external command.
///
/// The command reads HTML on stdin and writes the rendered document to
/// stdout, e.g. `weasyprint - -`.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    argv: Vec<String>,
    extension: String,
    working_dir: Option<PathBuf>,
}

impl CommandEngine {
    /// Create an engine running `argv`, producing `pdf` files.
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            extension: "pdf".to_owned(),
            working_dir: None,
        }
    }

    /// Set the extension of produced files.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Run the command in `dir`, so relative resource paths resolve there.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

impl RenderEngine for CommandEngine {
    fn render(&self, markup: &Markup, stylesheet: &Stylesheet) -> Result<Vec<u8>, RenderError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(RenderError::RenderFailure(
                "no render command configured".to_owned(),
            ));
        };
        let io_error = |source| RenderError::Io {
            command: self.command_line(),
            source,
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %self.command_line(), "Running render command");
        let mut child = command.spawn().map_err(io_error)?;

        let document = wrap_html(&markup.to_html(), stylesheet);
        let stdin = child.stdin.take();
        // Feed stdin from its own thread while wait_with_output drains stdout and stderr
        let writer = thread::spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(document.as_bytes())?;
            }
            Ok(())
        });

        let output = child.wait_with_output().map_err(io_error)?;
        let written = writer.join().unwrap_or(Ok(()));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::RenderFailure(format!(
                "{} exited with {}: {}",
                self.command_line(),
                output.status,
                stderr.trim()
            )));
        }
        // A command that exits successfully without reading all input is fine
        if let Err(e) = written
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(io_error(e));
        }

        tracing::debug!(bytes = output.stdout.len(), "Render command finished");
        Ok(output.stdout)
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::markup::{Block, TextBlock};

    assert_impl_all!(HtmlEngine: RenderEngine, Send, Sync);
    assert_impl_all!(CommandEngine: RenderEngine, Send, Sync);

    fn hello() -> Markup {
        Markup::new(vec![Block::Text(TextBlock::paragraph("Hello"))])
    }

    #[test]
    fn test_wrap_html_plain() {
        assert_eq!(
            wrap_html("<p>x</p>", &Stylesheet::default()),
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n</head>\n<body>\n<p>x</p>\n</body>\n</html>"
        );
    }

    #[test]
    fn test_wrap_html_with_styles() {
        let stylesheet = Stylesheet {
            inline: "body { color: red; }".to_owned(),
            external: vec!["https://fonts.example.com/a.css".to_owned()],
        };
        let html = wrap_html("", &stylesheet);
        assert!(html.contains(
            "<link rel=\"stylesheet\" href=\"https://fonts.example.com/a.css\">\n<style>\nbody { color: red; }\n</style>\n</head>"
        ));
    }

    #[test]
    fn test_html_engine() {
        let bytes = HtmlEngine.render(&hello(), &Stylesheet::default()).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("<body>\n<p>Hello</p>\n</body>"));
        assert_eq!(HtmlEngine.extension(), "html");
    }

    #[test]
    fn test_command_engine_empty_argv() {
        let err = CommandEngine::new(Vec::new())
            .render(&hello(), &Stylesheet::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::RenderFailure(_)));
    }

    #[test]
    fn test_command_engine_missing_program() {
        let err = CommandEngine::new(vec!["docco-no-such-renderer".to_owned()])
            .render(&hello(), &Stylesheet::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_engine_pipes_document() {
        let engine = CommandEngine::new(vec!["cat".to_owned()]).with_extension("txt");
        let bytes = engine.render(&hello(), &Stylesheet::default()).unwrap();
        assert_eq!(bytes, wrap_html("<p>Hello</p>", &Stylesheet::default()).into_bytes());
        assert_eq!(engine.extension(), "txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_engine_failure_is_verbatim() {
        let engine = CommandEngine::new(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "cat >/dev/null; echo 'font missing' >&2; exit 2".to_owned(),
        ]);
        let err = engine.render(&hello(), &Stylesheet::default()).unwrap_err();
        let RenderError::RenderFailure(message) = err else {
            panic!("expected render failure");
        };
        assert!(message.contains("font missing"), "{message}");
    }
}
