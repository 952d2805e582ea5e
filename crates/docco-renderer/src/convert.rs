//! Markdown to markup tree conversion.
//!
//! Walks `pulldown-cmark` events and builds a [`Markup`] tree. Inline
//! content is serialized to HTML as it arrives; block-level structure is
//! kept as nodes.

use pulldown_cmark::{
    Alignment, BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};

use crate::markup::{Block, CodeBlock, Container, Heading, Markup, Marker, TextBlock};
use crate::util::escape_html;

/// Parser options used for conversion.
#[must_use]
pub fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Convert markdown to a markup tree.
///
/// The input must already be fully expanded and language-filtered; any
/// directive comment left standing alone becomes a [`Block::Marker`].
#[must_use]
pub fn convert(text: &str) -> Markup {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(text, options()) {
        builder.event(event);
    }
    builder.finish()
}

/// Where inline content is being collected.
enum InlineTarget {
    Text {
        tag: Option<&'static str>,
        attrs: String,
    },
    Heading {
        level: u8,
        id: Option<String>,
    },
}

struct Inline {
    target: InlineTarget,
    html: String,
}

struct Frame {
    open: String,
    close: String,
    children: Vec<Block>,
}

/// Alt text capture for an image being parsed.
struct PendingImage {
    src: String,
    title: String,
    alt: String,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell_index: usize,
    body_open: bool,
}

impl TableState {
    fn alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Block>,
    frames: Vec<Frame>,
    inline: Option<Inline>,
    code: Option<CodeBlock>,
    html_block: Option<String>,
    image: Option<PendingImage>,
    table: TableState,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let html = format!("<code>{}</code>", escape_html(&code));
                self.push_inline(&html);
            }
            Event::Html(html) => match &mut self.html_block {
                Some(buffer) => buffer.push_str(&html),
                None => self.push_inline(&html),
            },
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => {
                if let Some(code) = &mut self.code {
                    code.content.push('\n');
                } else {
                    self.push_inline("\n");
                }
            }
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => {
                self.flush_implicit();
                self.push_block(Block::Raw("<hr>".to_owned()));
            }
            Event::TaskListMarker(checked) => {
                let checkbox = if checked {
                    r#"<input type="checkbox" disabled checked> "#
                } else {
                    r#"<input type="checkbox" disabled> "#
                };
                self.push_inline(checkbox);
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.start_inline(InlineTarget::Text {
                tag: Some("p"),
                attrs: String::new(),
            }),
            Tag::Heading { level, id, .. } => self.start_inline(InlineTarget::Heading {
                level: heading_level_to_num(level),
                id: id.map(|id| id.to_string()),
            }),
            Tag::BlockQuote(kind) => {
                let (open, close) = blockquote_markup(kind);
                self.open_frame(open, close);
            }
            Tag::CodeBlock(kind) => {
                self.flush_implicit();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeBlock {
                    language,
                    content: String::new(),
                });
            }
            Tag::HtmlBlock => {
                self.flush_implicit();
                self.html_block = Some(String::new());
            }
            Tag::List(start) => {
                let (open, close) = match start {
                    Some(1) => ("<ol>".to_owned(), "</ol>"),
                    Some(n) => (format!(r#"<ol start="{n}">"#), "</ol>"),
                    None => ("<ul>".to_owned(), "</ul>"),
                };
                self.open_frame(open, close.to_owned());
            }
            Tag::Item => self.open_frame("<li>".to_owned(), "</li>".to_owned()),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    ..TableState::default()
                };
                self.open_frame("<table>".to_owned(), "</table>".to_owned());
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell_index = 0;
                self.open_frame("<thead><tr>".to_owned(), "</tr></thead>".to_owned());
            }
            Tag::TableRow => {
                self.table.cell_index = 0;
                self.open_frame("<tr>".to_owned(), "</tr>".to_owned());
            }
            Tag::TableCell => {
                let tag = if self.table.in_head { "th" } else { "td" };
                let attrs = self.table.alignment_style().to_owned();
                self.start_inline(InlineTarget::Text {
                    tag: Some(tag),
                    attrs,
                });
            }
            Tag::DefinitionList => self.open_frame("<dl>".to_owned(), "</dl>".to_owned()),
            Tag::DefinitionListTitle => self.start_inline(InlineTarget::Text {
                tag: Some("dt"),
                attrs: String::new(),
            }),
            Tag::DefinitionListDefinition => {
                self.open_frame("<dd>".to_owned(), "</dd>".to_owned());
            }
            Tag::FootnoteDefinition(_) | Tag::MetadataBlock(_) => self.flush_implicit(),
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let title = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_html(&title))
                };
                let link = format!(r#"<a href="{}"{title}>"#, escape_html(&dest_url));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(PendingImage {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::TableCell
            | TagEnd::DefinitionListTitle => {
                self.finish_inline();
                if matches!(tag, TagEnd::TableCell) {
                    self.table.cell_index += 1;
                }
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.push_block(Block::Code(code));
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html_block.take() {
                    let block = match Marker::parse(&html) {
                        Some(marker) => Block::Marker(marker),
                        None => Block::Raw(html.trim_end().to_owned()),
                    };
                    self.push_block(block);
                }
            }
            TagEnd::TableHead => {
                self.close_frame();
                self.table.in_head = false;
                self.open_frame("<tbody>".to_owned(), "</tbody>".to_owned());
                self.table.body_open = true;
            }
            TagEnd::Table => {
                if std::mem::take(&mut self.table.body_open) {
                    self.close_frame();
                }
                self.close_frame();
            }
            TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::TableRow
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListDefinition => self.close_frame(),
            TagEnd::FootnoteDefinition | TagEnd::MetadataBlock(_) => self.flush_implicit(),
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    let title = if image.title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&image.title))
                    };
                    let img = format!(
                        r#"<img src="{}"{title} alt="{}">"#,
                        escape_html(&image.src),
                        escape_html(&image.alt)
                    );
                    self.push_inline(&img);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        // Priority: code > image alt > inline
        if let Some(code) = &mut self.code {
            code.content.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else {
            self.push_inline(&escape_html(text));
        }
    }

    /// Append inline HTML, starting bare text (tight list items) if no
    /// text-bearing element is open.
    fn push_inline(&mut self, html: &str) {
        let inline = self.inline.get_or_insert_with(|| Inline {
            target: InlineTarget::Text {
                tag: None,
                attrs: String::new(),
            },
            html: String::new(),
        });
        inline.html.push_str(html);
    }

    fn start_inline(&mut self, target: InlineTarget) {
        self.flush_implicit();
        self.inline = Some(Inline {
            target,
            html: String::new(),
        });
    }

    fn finish_inline(&mut self) {
        let Some(inline) = self.inline.take() else {
            return;
        };
        let block = match inline.target {
            InlineTarget::Text { tag: None, .. } if inline.html.trim().is_empty() => return,
            InlineTarget::Text { tag, attrs } => Block::Text(TextBlock {
                tag,
                attrs,
                inner: match tag {
                    Some(_) => inline.html,
                    None => inline.html.trim_end().to_owned(),
                },
            }),
            InlineTarget::Heading { level, id } => {
                let mut heading = Heading::new(level, inline.html.trim());
                heading.id = id;
                Block::Heading(heading)
            }
        };
        self.push_block(block);
    }

    /// Close bare list item text before block-level structure starts or ends.
    fn flush_implicit(&mut self) {
        if matches!(
            self.inline,
            Some(Inline {
                target: InlineTarget::Text { tag: None, .. },
                ..
            })
        ) {
            self.finish_inline();
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.frames.last_mut() {
            Some(frame) => frame.children.push(block),
            None => self.root.push(block),
        }
    }

    fn open_frame(&mut self, open: String, close: String) {
        self.flush_implicit();
        self.frames.push(Frame {
            open,
            close,
            children: Vec::new(),
        });
    }

    fn close_frame(&mut self) {
        self.flush_implicit();
        if let Some(frame) = self.frames.pop() {
            self.push_block(Block::Container(Container {
                open: frame.open,
                close: frame.close,
                children: frame.children,
            }));
        }
    }

    fn finish(mut self) -> Markup {
        self.flush_implicit();
        while !self.frames.is_empty() {
            self.close_frame();
        }
        Markup::new(self.root)
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn blockquote_markup(kind: Option<BlockQuoteKind>) -> (String, String) {
    let Some(kind) = kind else {
        return ("<blockquote>".to_owned(), "</blockquote>".to_owned());
    };
    let (class, title) = match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    };
    (
        format!(
            r#"<div class="alert alert-{class}"><div class="alert-title">{title}</div><div class="alert-content">"#
        ),
        "</div></div>".to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use docco_directives::LayoutKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn html(markdown: &str) -> String {
        convert(markdown).to_html()
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(html("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_and_paragraph_blocks() {
        let markup = convert("# Title\n\nSome *text* here.\n");
        assert_eq!(markup.blocks.len(), 2);
        assert_eq!(markup.blocks[0], Block::Heading(Heading::new(1, "Title")));
        assert_eq!(
            markup.blocks[1],
            Block::Text(TextBlock::paragraph("Some <em>text</em> here."))
        );
    }

    #[test]
    fn test_explicit_heading_id() {
        let markup = convert("## Setup {#install}\n");
        let headings = markup.headings();
        assert_eq!(headings[0].id.as_deref(), Some("install"));
        assert_eq!(headings[0].inner, "Setup");
    }

    #[test]
    fn test_text_escaped() {
        assert_eq!(html("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_tight_list_items_are_text_units() {
        let markup = convert("- one\n- two **bold**\n");
        assert_eq!(markup.text_units(), vec!["one", "two <strong>bold</strong>"]);
        assert_eq!(
            markup.to_html(),
            "<ul><li>one</li><li>two <strong>bold</strong></li></ul>"
        );
    }

    #[test]
    fn test_nested_list() {
        let markup = convert("1. outer\n   - inner\n2. next\n");
        assert_eq!(markup.text_units(), vec!["outer", "inner", "next"]);
        assert_eq!(
            markup.to_html(),
            "<ol><li>outer<ul><li>inner</li></ul></li><li>next</li></ol>"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(html("3. three\n4. four\n"), r#"<ol start="3"><li>three</li><li>four</li></ol>"#);
    }

    #[test]
    fn test_table() {
        let markup = convert("| A | B |\n|:--|--:|\n| 1 | 2 |\n");
        assert_eq!(markup.text_units(), vec!["A", "B", "1", "2"]);
        assert_eq!(
            markup.to_html(),
            "<table><thead><tr>\
             <th style=\"text-align:left\">A</th><th style=\"text-align:right\">B</th>\
             </tr></thead><tbody><tr>\
             <td style=\"text-align:left\">1</td><td style=\"text-align:right\">2</td>\
             </tr></tbody></table>"
        );
    }

    #[test]
    fn test_code_block_not_text_unit() {
        let markup = convert("```rust\nfn main() {}\n```\n");
        assert!(markup.text_units().is_empty());
        assert_eq!(
            markup.to_html(),
            r#"<pre><code class="language-rust">fn main() {}
</code></pre>"#
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(html("> quoted\n"), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn test_alert() {
        assert_eq!(
            html("> [!NOTE]\n> Heads up\n"),
            r#"<div class="alert alert-note"><div class="alert-title">Note</div><div class="alert-content"><p>Heads up</p></div></div>"#
        );
    }

    #[test]
    fn test_markers_become_marker_blocks() {
        let markup = convert("<!-- TOC -->\n\n<!-- toc:exclude -->\n# Preface\n\n<!-- pagebreak -->\n");
        assert_eq!(markup.blocks[0], Block::Marker(Marker::Toc));
        assert_eq!(markup.blocks[1], Block::Marker(Marker::TocExclude));
        assert!(matches!(markup.blocks[2], Block::Heading(_)));
        assert_eq!(markup.blocks[3], Block::Marker(Marker::Layout(LayoutKind::PageBreak)));
    }

    #[test]
    fn test_other_html_is_raw() {
        let markup = convert("<div class=\"note\">\n<b>hi</b>\n</div>\n");
        assert_eq!(
            markup.blocks,
            vec![Block::Raw("<div class=\"note\">\n<b>hi</b>\n</div>".to_owned())]
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            html("[site](https://example.com \"Home\") ![logo](img/logo.png)"),
            r#"<p><a href="https://example.com" title="Home">site</a> <img src="img/logo.png" alt="logo"></p>"#
        );
    }

    #[test]
    fn test_tasklist() {
        assert_eq!(
            html("- [x] done\n- [ ] open\n"),
            r#"<ul><li><input type="checkbox" disabled checked> done</li><li><input type="checkbox" disabled> open</li></ul>"#
        );
    }

    #[test]
    fn test_rule() {
        assert_eq!(html("a\n\n---\n\nb"), "<p>a</p>\n<hr>\n<p>b</p>");
    }
}
