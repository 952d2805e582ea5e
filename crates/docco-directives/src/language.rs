//! Language block filtering.
//!
//! Content between `<!-- lang:CODE -->` and `<!-- /lang -->` belongs to one
//! language; everything else is shared by all languages.

use std::collections::BTreeSet;

use crate::error::FilterError;
use crate::marker::{self, Directive, DirectiveKind};

/// A language block located in a text.
struct Block {
    code: String,
    /// Start of the opening marker.
    start: usize,
    /// End of the opening marker.
    body_start: usize,
    /// Start of the closing marker.
    body_end: usize,
    /// End of the closing marker.
    end: usize,
}

/// Keep shared content and blocks for `active`; drop blocks for other languages.
///
/// Language codes are compared exactly (`NL` does not match `nl`). Markers
/// inside code spans are content, not markers.
///
/// # Errors
///
/// Returns [`FilterError::MalformedLanguageBlock`] for an unterminated
/// block, a closing marker without an opening one, or a nested block.
pub fn filter_language(text: &str, active: &str) -> Result<String, FilterError> {
    let directives = marker::scan(text);
    let blocks = pair_blocks(&directives)?;

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for block in &blocks {
        out.push_str(&text[last..block.start]);
        if block.code == active {
            out.push_str(&text[block.body_start..block.body_end]);
        }
        last = block.end;
    }
    out.push_str(&text[last..]);

    tracing::debug!(
        language = active,
        blocks = blocks.len(),
        kept = blocks.iter().filter(|b| b.code == active).count(),
        "Filtered language blocks"
    );
    Ok(out)
}

/// Language codes declared by blocks in `text`, sorted and deduplicated.
///
/// # Errors
///
/// Returns [`FilterError::MalformedLanguageBlock`] if blocks are unbalanced.
pub fn declared_languages(text: &str) -> Result<Vec<String>, FilterError> {
    let directives = marker::scan(text);
    let codes: BTreeSet<_> = pair_blocks(&directives)?
        .into_iter()
        .map(|b| b.code)
        .collect();
    Ok(codes.into_iter().collect())
}

/// Check that language blocks in `text` are balanced and not nested.
///
/// # Errors
///
/// Returns [`FilterError::MalformedLanguageBlock`] with the line in `text`.
pub fn check_language_blocks(text: &str) -> Result<(), FilterError> {
    pair_blocks(&marker::scan(text)).map(|_| ())
}

fn pair_blocks(directives: &[Directive]) -> Result<Vec<Block>, FilterError> {
    let mut blocks = Vec::new();
    let mut open: Option<(&Directive, &str)> = None;

    for directive in directives {
        match &directive.kind {
            DirectiveKind::LangStart { code } => {
                if let Some((outer, outer_code)) = open {
                    return Err(FilterError::MalformedLanguageBlock {
                        line: directive.line,
                        reason: format!(
                            "block for '{code}' nested inside block for '{outer_code}' opened on line {}",
                            outer.line
                        ),
                    });
                }
                open = Some((directive, code.as_str()));
            }
            DirectiveKind::LangEnd => {
                let Some((start, code)) = open.take() else {
                    return Err(FilterError::MalformedLanguageBlock {
                        line: directive.line,
                        reason: "closing marker without an opening marker".to_owned(),
                    });
                };
                blocks.push(Block {
                    code: code.to_owned(),
                    start: start.span.start,
                    body_start: start.span.end,
                    body_end: directive.span.start,
                    end: directive.span.end,
                });
            }
            _ => {}
        }
    }

    if let Some((start, code)) = open {
        return Err(FilterError::MalformedLanguageBlock {
            line: start.line,
            reason: format!("block for '{code}' is never closed"),
        });
    }

    Ok(blocks)
}
