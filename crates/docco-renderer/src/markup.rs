//! Markup tree produced by [`convert`](crate::convert).
//!
//! The tree keeps text-bearing blocks (paragraphs, headings, list item text,
//! table cells) as serialized inline HTML so later stages can treat each one
//! as a unit: translation replaces it, numbering prefixes it.

use docco_directives::{DirectiveKind, LayoutKind, parse_marker};

use crate::layout::Orientation;
use crate::util::escape_html;

/// A converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    /// Top-level blocks in document order.
    pub blocks: Vec<Block>,
}

/// One block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Section heading.
    Heading(Heading),
    /// Text-bearing element such as a paragraph or table cell.
    Text(TextBlock),
    /// Structural element wrapping other blocks (lists, quotes, tables).
    Container(Container),
    /// Fenced or indented code block.
    Code(CodeBlock),
    /// Raw HTML, emitted unchanged.
    Raw(String),
    /// Directive comment that survived expansion.
    Marker(Marker),
    /// Orientation section created by layout annotation.
    Section(Section),
}

/// A heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Markdown heading level (1-6).
    pub level: u8,
    /// Anchor id, explicit (`{#id}`) or assigned by numbering.
    pub id: Option<String>,
    /// Inner HTML.
    pub inner: String,
    /// Rendered number (`1.2`, `A`), assigned by numbering.
    pub number: Option<String>,
    /// Preceded by an appendix marker.
    pub appendix: bool,
    /// Excluded from numbering and the table of contents.
    pub excluded: bool,
}

impl Heading {
    /// Create an unnumbered heading.
    #[must_use]
    pub fn new(level: u8, inner: impl Into<String>) -> Self {
        Self {
            level,
            id: None,
            inner: inner.into(),
            number: None,
            appendix: false,
            excluded: false,
        }
    }

    fn to_html(&self) -> String {
        let level = self.level;
        let id = self
            .id
            .as_ref()
            .map(|id| format!(r#" id="{}""#, escape_html(id)))
            .unwrap_or_default();
        let number = self
            .number
            .as_ref()
            .map(|n| format!(r#"<span class="heading-number">{n} </span>"#))
            .unwrap_or_default();
        format!("<h{level}{id}>{number}{}</h{level}>", self.inner)
    }
}

/// A text-bearing element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Wrapping element (`p`, `td`, `th`); `None` for bare list item text.
    pub tag: Option<&'static str>,
    /// Extra attributes rendered on the opening tag, with a leading space.
    pub attrs: String,
    /// Inner HTML.
    pub inner: String,
}

impl TextBlock {
    /// Create a paragraph.
    #[must_use]
    pub fn paragraph(inner: impl Into<String>) -> Self {
        Self {
            tag: Some("p"),
            attrs: String::new(),
            inner: inner.into(),
        }
    }

    fn to_html(&self) -> String {
        match self.tag {
            Some(tag) => format!("<{tag}{}>{}</{tag}>", self.attrs, self.inner),
            None => self.inner.clone(),
        }
    }
}

/// Structural element wrapping child blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Opening markup, e.g. `<ul>`.
    pub open: String,
    /// Closing markup, e.g. `</ul>`.
    pub close: String,
    /// Child blocks.
    pub children: Vec<Block>,
}

/// A code block. Content is kept unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info string language, if any.
    pub language: Option<String>,
    /// Raw code.
    pub content: String,
}

impl CodeBlock {
    fn to_html(&self) -> String {
        match &self.language {
            Some(lang) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(&self.content)
            ),
            None => format!("<pre><code>{}</code></pre>", escape_html(&self.content)),
        }
    }
}

/// Directive comment recognised in the converted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `<!-- TOC -->`
    Toc,
    /// `<!-- toc:exclude -->`
    TocExclude,
    /// `<!-- addendum -->` or `<!-- appendix -->`
    Appendix,
    /// `<!-- pagebreak -->`, `<!-- landscape -->`, `<!-- portrait -->`
    Layout(LayoutKind),
}

impl Marker {
    /// Recognise an HTML block consisting of a single marker comment.
    #[must_use]
    pub fn parse(html: &str) -> Option<Self> {
        match parse_marker(html)? {
            DirectiveKind::TocMarker => Some(Self::Toc),
            DirectiveKind::TocExclude => Some(Self::TocExclude),
            DirectiveKind::Appendix => Some(Self::Appendix),
            DirectiveKind::Layout(kind) => Some(Self::Layout(kind)),
            DirectiveKind::Include { .. } | DirectiveKind::LangStart { .. } | DirectiveKind::LangEnd => {
                None
            }
        }
    }
}

/// Content laid out with one page orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Page orientation.
    pub orientation: Orientation,
    /// Blocks in this section.
    pub blocks: Vec<Block>,
}

impl Block {
    /// Serialize this block to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Heading(heading) => heading.to_html(),
            Self::Text(text) => text.to_html(),
            Self::Container(container) => {
                let mut out = container.open.clone();
                for child in &container.children {
                    out.push_str(&child.to_html());
                }
                out.push_str(&container.close);
                out
            }
            Self::Code(code) => code.to_html(),
            Self::Raw(html) => html.clone(),
            // Markers are instructions, not content
            Self::Marker(_) => String::new(),
            Self::Section(section) => format!(
                "<div class=\"section-wrapper {}\">\n{}\n</div>",
                section.orientation.as_str(),
                join_blocks(&section.blocks)
            ),
        }
    }
}

impl Markup {
    /// Create markup from blocks.
    #[must_use]
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Serialize to HTML. Output is deterministic: top-level blocks are
    /// separated by one newline and blocks rendering to nothing are skipped.
    #[must_use]
    pub fn to_html(&self) -> String {
        join_blocks(&self.blocks)
    }

    /// Inner HTML of every heading and text block, in document order.
    #[must_use]
    pub fn text_units(&self) -> Vec<&str> {
        let mut units = Vec::new();
        visit(&self.blocks, &mut |block| match block {
            Block::Heading(heading) => units.push(heading.inner.as_str()),
            Block::Text(text) => units.push(text.inner.as_str()),
            _ => {}
        });
        units
    }

    /// Replace the inner HTML of heading and text blocks.
    ///
    /// `f` receives the current inner HTML and returns the replacement, or
    /// `None` to keep it. Returns the number of replaced units.
    pub fn map_text(&mut self, mut f: impl FnMut(&str) -> Option<String>) -> usize {
        let mut replaced = 0;
        visit_mut(&mut self.blocks, &mut |block| {
            let inner = match block {
                Block::Heading(heading) => &mut heading.inner,
                Block::Text(text) => &mut text.inner,
                _ => return,
            };
            if let Some(next) = f(inner) {
                *inner = next;
                replaced += 1;
            }
        });
        replaced
    }

    /// All headings in document order.
    #[must_use]
    pub fn headings(&self) -> Vec<&Heading> {
        let mut headings = Vec::new();
        visit(&self.blocks, &mut |block| {
            if let Block::Heading(heading) = block {
                headings.push(heading);
            }
        });
        headings
    }

    /// Whether the document contains `marker` anywhere.
    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        let mut found = false;
        visit(&self.blocks, &mut |block| {
            found |= matches!(block, Block::Marker(m) if *m == marker);
        });
        found
    }
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::to_html)
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pre-order traversal.
pub(crate) fn visit<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Block)) {
    for block in blocks {
        f(block);
        match block {
            Block::Container(container) => visit(&container.children, f),
            Block::Section(section) => visit(&section.blocks, f),
            _ => {}
        }
    }
}

/// Pre-order traversal with mutable access.
pub(crate) fn visit_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut Block)) {
    for block in blocks {
        f(block);
        match block {
            Block::Container(container) => visit_mut(&mut container.children, f),
            Block::Section(section) => visit_mut(&mut section.blocks, f),
            _ => {}
        }
    }
}

/// Drop blocks at any depth for which `keep` returns false.
pub(crate) fn retain(blocks: &mut Vec<Block>, keep: &impl Fn(&Block) -> bool) {
    blocks.retain(|block| keep(block));
    for block in blocks {
        match block {
            Block::Container(container) => retain(&mut container.children, keep),
            Block::Section(section) => retain(&mut section.blocks, keep),
            _ => {}
        }
    }
}
