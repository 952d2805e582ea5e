//! Directive marker parsing.
//!
//! Directives are HTML comments:
//!
//! - `<!-- include:"path" key="value" -->` (`inline:` is accepted as a synonym)
//! - `<!-- lang:CODE -->` ... `<!-- /lang -->`
//! - `<!-- TOC -->`, `<!-- toc:exclude -->`, `<!-- addendum -->` (or `appendix`)
//! - `<!-- pagebreak -->`, `<!-- landscape -->`, `<!-- portrait -->`
//!
//! Keywords are case-sensitive; whitespace inside the comment is free.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::args::DirectiveArgs;
use crate::literal::LiteralSpans;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?sx)
        <!--\s*
        (?:
            (?:include|inline)\s*:\s*"(?P<target>[^"]*)"(?P<args>.*?)
          | lang\s*:\s*(?P<lang>\w+)
          | (?P<lang_end>/lang)
          | (?P<word>TOC|toc:exclude|addendum|appendix|pagebreak|landscape|portrait)
        )
        \s*-->"#,
    )
    .unwrap()
});

/// Page layout instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Force a page break.
    PageBreak,
    /// Following content is laid out in landscape orientation.
    Landscape,
    /// Following content is laid out in portrait orientation.
    Portrait,
}

impl LayoutKind {
    /// CSS class name for this layout kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageBreak => "pagebreak",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }
}

/// What a directive asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Substitute the content of another fragment.
    Include {
        /// Fragment path as written.
        target: String,
        /// Placeholder arguments.
        args: DirectiveArgs,
    },
    /// Start of a language-specific block.
    LangStart {
        /// Declared language code.
        code: String,
    },
    /// End of a language-specific block.
    LangEnd,
    /// Page layout instruction.
    Layout(LayoutKind),
    /// Table of contents insertion point.
    TocMarker,
    /// The next heading is excluded from numbering and the TOC.
    TocExclude,
    /// The next heading is an appendix heading.
    Appendix,
}

/// A directive found in a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Parsed directive.
    pub kind: DirectiveKind,
    /// Byte range of the whole marker.
    pub span: Range<usize>,
    /// Line number where the marker starts (1-indexed).
    pub line: usize,
}

/// Find all directive markers outside literal spans, in document order.
#[must_use]
pub fn scan(text: &str) -> Vec<Directive> {
    let literals = LiteralSpans::scan(text);
    scan_with(text, &literals)
}

/// Like [`scan`], with literal spans computed by the caller.
#[must_use]
pub fn scan_with(text: &str, literals: &LiteralSpans) -> Vec<Directive> {
    let mut line = 1;
    let mut counted_to = 0;

    MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if literals.contains(whole.start()) {
                return None;
            }
            line += text[counted_to..whole.start()].matches('\n').count();
            counted_to = whole.start();
            Some(Directive {
                kind: kind_from_captures(&caps)?,
                span: whole.range(),
                line,
            })
        })
        .collect()
}

/// Parse a single standalone marker such as an HTML comment node.
///
/// Returns `None` unless the whole (trimmed) input is exactly one marker.
#[must_use]
pub fn parse_marker(comment: &str) -> Option<DirectiveKind> {
    let trimmed = comment.trim();
    let caps = MARKER_RE.captures(trimmed)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != trimmed.len() {
        return None;
    }
    kind_from_captures(&caps)
}

fn kind_from_captures(caps: &regex::Captures<'_>) -> Option<DirectiveKind> {
    if let Some(target) = caps.name("target") {
        let args = caps
            .name("args")
            .map_or_else(DirectiveArgs::default, |m| DirectiveArgs::parse(m.as_str()));
        return Some(DirectiveKind::Include {
            target: target.as_str().to_owned(),
            args,
        });
    }
    if let Some(code) = caps.name("lang") {
        return Some(DirectiveKind::LangStart {
            code: code.as_str().to_owned(),
        });
    }
    if caps.name("lang_end").is_some() {
        return Some(DirectiveKind::LangEnd);
    }
    let kind = match caps.name("word")?.as_str() {
        "TOC" => DirectiveKind::TocMarker,
        "toc:exclude" => DirectiveKind::TocExclude,
        "addendum" | "appendix" => DirectiveKind::Appendix,
        "pagebreak" => DirectiveKind::Layout(LayoutKind::PageBreak),
        "landscape" => DirectiveKind::Layout(LayoutKind::Landscape),
        "portrait" => DirectiveKind::Layout(LayoutKind::Portrait),
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn include(target: &str, args: &str) -> DirectiveKind {
        DirectiveKind::Include {
            target: target.to_owned(),
            args: DirectiveArgs::parse(args),
        }
    }

    #[test]
    fn test_scan_include_with_args() {
        let found = scan(r#"<!-- include:"a.md" name="X" -->"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, include("a.md", r#"name="X""#));
        assert_eq!(found[0].span, 0..32);
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn test_inline_keyword_synonym() {
        let found = scan(r#"<!--   inline   :   "t.md"   -->"#);
        assert_eq!(found[0].kind, include("t.md", ""));
    }

    #[test]
    fn test_mid_line_marker() {
        let text = "Some text <!-- include:\"a.md\" --> more text";
        let found = scan(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span.start, 10);
    }

    #[test]
    fn test_line_numbers() {
        let text = "one\n<!-- TOC -->\n\nfour\n<!-- pagebreak -->";
        let lines: Vec<_> = scan(text).iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn test_markers_in_code_skipped() {
        let text = "`<!-- TOC -->`\n```\n<!-- include:\"a.md\" -->\n```\n<!-- /lang -->";
        let found = scan(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DirectiveKind::LangEnd);
        assert_eq!(found[0].line, 5);
    }

    #[test]
    fn test_lang_markers() {
        let found = scan("<!--   lang:NL   -->x<!--/lang-->");
        assert_eq!(
            found.iter().map(|d| d.kind.clone()).collect::<Vec<_>>(),
            vec![
                DirectiveKind::LangStart {
                    code: "NL".to_owned()
                },
                DirectiveKind::LangEnd
            ]
        );
    }

    #[test]
    fn test_keywords_case_sensitive() {
        assert!(scan("<!-- Include:\"a.md\" -->").is_empty());
        assert!(scan("<!-- Pagebreak -->").is_empty());
    }

    #[test]
    fn test_plain_comment_ignored() {
        assert!(scan("<!-- just a note -->").is_empty());
    }

    #[test]
    fn test_parse_marker_structural() {
        assert_eq!(parse_marker("<!-- TOC -->"), Some(DirectiveKind::TocMarker));
        assert_eq!(
            parse_marker("  <!--toc:exclude-->\n"),
            Some(DirectiveKind::TocExclude)
        );
        assert_eq!(parse_marker("<!-- addendum -->"), Some(DirectiveKind::Appendix));
        assert_eq!(parse_marker("<!-- appendix -->"), Some(DirectiveKind::Appendix));
        assert_eq!(
            parse_marker("<!-- landscape -->"),
            Some(DirectiveKind::Layout(LayoutKind::Landscape))
        );
    }

    #[test]
    fn test_parse_marker_requires_whole_input() {
        assert_eq!(parse_marker("text <!-- TOC -->"), None);
        assert_eq!(parse_marker("<!-- TOC --><!-- TOC -->"), None);
        assert_eq!(parse_marker("<!-- note -->"), None);
    }
}
