//! Page layout annotation.
//!
//! Turns layout markers into the structure the render engine styles:
//! `<!-- pagebreak -->` becomes a break element, and `<!-- landscape -->` /
//! `<!-- portrait -->` split the document into orientation sections.

use docco_directives::LayoutKind;

use crate::markup::{self, Block, Marker, Markup, Section};

/// Page orientation of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// CSS class name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

const PAGE_BREAK: &str = r#"<div class="pagebreak"></div>"#;

/// Apply layout markers.
///
/// Top-level content is wrapped in orientation sections, starting in
/// portrait. Sections with no rendered content are dropped. Orientation
/// markers nested inside other blocks have no effect.
#[must_use]
pub fn annotate(mut markup: Markup) -> Markup {
    markup::visit_mut(&mut markup.blocks, &mut |block| {
        if matches!(block, Block::Marker(Marker::Layout(LayoutKind::PageBreak))) {
            *block = Block::Raw(PAGE_BREAK.to_owned());
        }
    });

    let mut sections = Vec::new();
    let mut current = Section {
        orientation: Orientation::Portrait,
        blocks: Vec::new(),
    };

    for block in markup.blocks {
        let next = match block {
            Block::Marker(Marker::Layout(LayoutKind::Landscape)) => Orientation::Landscape,
            Block::Marker(Marker::Layout(LayoutKind::Portrait)) => Orientation::Portrait,
            block => {
                current.blocks.push(block);
                continue;
            }
        };
        let finished = std::mem::replace(
            &mut current,
            Section {
                orientation: next,
                blocks: Vec::new(),
            },
        );
        push_section(&mut sections, finished);
    }
    push_section(&mut sections, current);

    tracing::debug!(sections = sections.len(), "Applied page layout");
    Markup::new(sections.into_iter().map(Block::Section).collect())
}

fn push_section(sections: &mut Vec<Section>, section: Section) {
    let has_content = section
        .blocks
        .iter()
        .any(|block| !block.to_html().trim().is_empty());
    if has_content {
        sections.push(section);
    }
}
