//! Heading numbering and table of contents.
//!
//! One pass over the headings of a [`Markup`] tree, in document order:
//!
//! - Regular headings get hierarchical numbers (`1`, `1.2`, `1.2.3`).
//! - Headings preceded by `<!-- addendum -->` get letters (`A`, `B`); their
//!   subsections continue as `A.1`, `A.2`.
//! - Headings preceded by `<!-- toc:exclude -->` get no number and are left
//!   out of the table of contents.
//!
//! Every `<!-- TOC -->` marker is then replaced with the rendered table.

use std::collections::HashMap;

use crate::markup::{self, Block, Heading, Marker, Markup};
use crate::util::{escape_html, plain_text, slugify};

/// Deepest heading level that can be numbered.
pub const MAX_NUMBERED_LEVEL: u8 = 3;

/// Numbering options.
#[derive(Debug, Clone, Copy)]
pub struct NumberingConfig {
    /// Headings deeper than this are neither numbered nor listed.
    pub max_level: u8,
    /// Excluding a heading also excludes its subsections.
    pub cascade_exclude: bool,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            max_level: MAX_NUMBERED_LEVEL,
            cascade_exclude: false,
        }
    }
}

impl NumberingConfig {
    /// Set the deepest numbered level, clamped to 1..=3.
    #[must_use]
    pub fn with_max_level(mut self, max_level: u8) -> Self {
        self.max_level = max_level.clamp(1, MAX_NUMBERED_LEVEL);
        self
    }

    /// Set whether exclusion cascades to subsections.
    #[must_use]
    pub fn with_cascade_exclude(mut self, cascade: bool) -> Self {
        self.cascade_exclude = cascade;
        self
    }
}

/// Section counters for one numbering pass.
///
/// Incrementing a level resets every deeper level. The appendix counter is
/// independent of the regular counters.
#[derive(Debug, Default)]
pub struct CounterState {
    regular: [u32; MAX_NUMBERED_LEVEL as usize],
    appendix: u32,
    /// Level and letter of the appendix whose subsections are being numbered.
    scope: Option<(u8, String)>,
}

impl CounterState {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for a regular heading at `level` (1..=3) and
    /// return its number.
    ///
    /// Zero counters are omitted, so a level-2 heading with no numbered
    /// level-1 ancestor renders as `1`, not `0.1`.
    pub fn next_regular(&mut self, level: u8) -> String {
        let index = usize::from(level.clamp(1, MAX_NUMBERED_LEVEL)) - 1;
        self.regular[index] += 1;
        self.regular[index + 1..].fill(0);

        if let Some((scope_level, letter)) = &self.scope
            && level > *scope_level
        {
            let mut parts = vec![letter.clone()];
            parts.extend(join_nonzero(&self.regular[usize::from(*scope_level)..=index]));
            return parts.join(".");
        }
        self.scope = None;
        join_nonzero(&self.regular[..=index]).collect::<Vec<_>>().join(".")
    }

    /// Advance the appendix counter for an appendix heading at `level` and
    /// return its letter.
    pub fn next_appendix(&mut self, level: u8) -> String {
        let index = usize::from(level.clamp(1, MAX_NUMBERED_LEVEL)) - 1;
        self.appendix += 1;
        self.regular[index + 1..].fill(0);
        let letter = appendix_letter(self.appendix);
        self.scope = Some((level, letter.clone()));
        letter
    }
}

fn join_nonzero(counters: &[u32]) -> impl Iterator<Item = String> + '_ {
    counters.iter().filter(|&&c| c > 0).map(u32::to_string)
}

/// Letters for the n-th appendix (1-indexed): `A`..`Z`, then `AA`, `AB`, ...
fn appendix_letter(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + u8::try_from(n % 26).unwrap_or(0)));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// A heading as seen by the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    /// 0 for appendix headings, otherwise the markdown heading level.
    pub level: u8,
    /// Markdown heading level, used for nesting.
    pub depth: u8,
    /// Assigned number; `None` when excluded.
    pub number: Option<String>,
    /// Plain-text title.
    pub title: String,
    /// Anchor id.
    pub id: String,
    /// Excluded from numbering and listing.
    pub excluded: bool,
    /// Subsections.
    pub children: Vec<HeadingNode>,
}

/// Table of contents tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toc {
    /// Top-level headings.
    pub nodes: Vec<HeadingNode>,
}

impl Toc {
    fn push(&mut self, node: HeadingNode) {
        let mut siblings = &mut self.nodes;
        while siblings.last().is_some_and(|last| last.depth < node.depth) {
            let index = siblings.len() - 1;
            siblings = &mut siblings[index].children;
        }
        siblings.push(node);
    }

    /// Listed (non-excluded) headings in document order.
    #[must_use]
    pub fn entries(&self) -> Vec<&HeadingNode> {
        fn walk<'a>(nodes: &'a [HeadingNode], out: &mut Vec<&'a HeadingNode>) {
            for node in nodes {
                if !node.excluded {
                    out.push(node);
                }
                walk(&node.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Whether no heading is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Render as nested lists inside `<nav class="toc">`.
    ///
    /// A jump of more than one level opens the intermediate lists.
    #[must_use]
    pub fn to_html(&self) -> String {
        let entries = self.entries();
        if entries.is_empty() {
            return r#"<nav class="toc"><p>No headings found</p></nav>"#.to_owned();
        }

        let mut lines = vec![r#"<nav class="toc">"#.to_owned()];
        // One element per open <ul>: whether it has an open <li>
        let mut open: Vec<bool> = Vec::new();

        for entry in entries {
            let depth = usize::from(entry.depth);
            while open.len() > depth {
                close_list(&mut open, &mut lines);
            }
            if open.len() == depth
                && let Some(li_open) = open.last_mut()
                && *li_open
            {
                lines.push("</li>".to_owned());
                *li_open = false;
            }
            while open.len() < depth {
                lines.push(format!(r#"<ul class="toc-level-{}">"#, open.len() + 1));
                open.push(false);
            }

            let number = entry.number.as_deref().unwrap_or_default();
            lines.push(format!(
                r##"<li><a href="#{}"><span class="toc-number">{number} </span>{}</a>"##,
                escape_html(&entry.id),
                escape_html(&entry.title)
            ));
            if let Some(li_open) = open.last_mut() {
                *li_open = true;
            }
        }

        while !open.is_empty() {
            close_list(&mut open, &mut lines);
        }
        lines.push("</nav>".to_owned());
        lines.join("\n")
    }
}

fn close_list(open: &mut Vec<bool>, lines: &mut Vec<String>) {
    if open.pop() == Some(true) {
        lines.push("</li>".to_owned());
    }
    lines.push("</ul>".to_owned());
}

/// Result of numbering a document.
#[derive(Debug, Clone)]
pub struct Numbered {
    /// Markup with numbered headings and the table of contents inserted.
    pub markup: Markup,
    /// Table of contents tree.
    pub toc: Toc,
}

/// Numbering engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numbering {
    config: NumberingConfig,
}

impl Numbering {
    /// Create a numbering engine.
    #[must_use]
    pub fn new(config: NumberingConfig) -> Self {
        Self { config }
    }

    /// Number the headings of `markup` and build its table of contents.
    ///
    /// Counters start from zero on every call. Consumed exclusion and
    /// appendix markers are removed; each TOC marker is replaced by the
    /// rendered table.
    #[must_use]
    pub fn number(&self, mut markup: Markup) -> Numbered {
        let mut pass = Pass::new(self.config);
        markup::visit_mut(&mut markup.blocks, &mut |block| pass.block(block));
        let toc = pass.toc;

        markup::retain(&mut markup.blocks, &|block| {
            !matches!(block, Block::Marker(Marker::TocExclude | Marker::Appendix))
        });

        let toc_html = toc.to_html();
        let mut inserted = 0;
        markup::visit_mut(&mut markup.blocks, &mut |block| {
            if matches!(block, Block::Marker(Marker::Toc)) {
                *block = Block::Raw(toc_html.clone());
                inserted += 1;
            }
        });

        tracing::debug!(
            headings = toc.entries().len(),
            toc_inserted = inserted,
            "Numbered headings"
        );
        Numbered { markup, toc }
    }
}

/// State of one numbering pass.
struct Pass {
    config: NumberingConfig,
    counters: CounterState,
    ids: HashMap<String, usize>,
    toc: Toc,
    pending_exclude: bool,
    pending_appendix: bool,
    /// Level of the excluded heading whose subsections are also excluded.
    cascade_from: Option<u8>,
}

impl Pass {
    fn new(config: NumberingConfig) -> Self {
        Self {
            config,
            counters: CounterState::new(),
            ids: HashMap::new(),
            toc: Toc::default(),
            pending_exclude: false,
            pending_appendix: false,
            cascade_from: None,
        }
    }

    fn block(&mut self, block: &mut Block) {
        match block {
            Block::Marker(Marker::TocExclude) => self.pending_exclude = true,
            Block::Marker(Marker::Appendix) => self.pending_appendix = true,
            Block::Marker(_) => {}
            Block::Heading(heading) => {
                self.heading(heading);
                self.pending_exclude = false;
                self.pending_appendix = false;
            }
            // Containers are entered after this call; their first child may
            // still be the heading a marker points at.
            Block::Container(_) | Block::Section(_) => {}
            _ => {
                self.pending_exclude = false;
                self.pending_appendix = false;
            }
        }
    }

    fn heading(&mut self, heading: &mut Heading) {
        heading.appendix = self.pending_appendix;

        if self
            .cascade_from
            .is_some_and(|level| heading.level <= level)
        {
            self.cascade_from = None;
        }
        let excluded = self.pending_exclude || self.cascade_from.is_some();
        if self.pending_exclude && self.config.cascade_exclude {
            self.cascade_from = Some(heading.level);
        }
        heading.excluded = excluded;

        let numbered = heading.level <= self.config.max_level;
        let number = (numbered && !excluded).then(|| {
            if heading.appendix {
                self.counters.next_appendix(heading.level)
            } else {
                self.counters.next_regular(heading.level)
            }
        });

        let title = plain_text(&heading.inner);
        let id = match &heading.id {
            Some(id) => {
                *self.ids.entry(id.clone()).or_default() += 1;
                id.clone()
            }
            None => self.generate_id(&title, number.as_deref()),
        };
        heading.id = Some(id.clone());
        heading.number.clone_from(&number);

        if numbered {
            self.toc.push(HeadingNode {
                level: if heading.appendix { 0 } else { heading.level },
                depth: heading.level,
                number,
                title: title.trim().to_owned(),
                id,
                excluded,
                children: Vec::new(),
            });
        }
    }

    /// Slug of the title, deduplicated with a `-N` suffix.
    fn generate_id(&mut self, title: &str, number: Option<&str>) -> String {
        let mut base_id = slugify(title);
        if base_id.is_empty() {
            base_id = match number {
                Some(number) => format!("section-{}", slugify(&number.replace('.', "-"))),
                None => "heading".to_owned(),
            };
        }
        let count = self.ids.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }
}
