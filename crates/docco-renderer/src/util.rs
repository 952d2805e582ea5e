//! Text helpers shared by conversion and numbering.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Characters escaped in HTML text and attributes. `&` comes first so that
/// decoding in reverse order never produces a new entity.
const ENTITIES: [(char, &str); 5] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#x27;"),
];

/// Heading slug: lowercase alphanumeric words joined by single dashes.
///
/// Whitespace, `-` and `_` separate words; other punctuation is dropped.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match ENTITIES.iter().find(|(ch, _)| *ch == c) {
            Some((_, entity)) => out.push_str(entity),
            None => out.push(c),
        }
    }
    out
}

/// Plain text of an inline HTML fragment: tags removed, the entities
/// produced by [`escape_html`] decoded.
#[must_use]
pub fn plain_text(html: &str) -> String {
    ENTITIES
        .iter()
        .rev()
        .fold(TAG_RE.replace_all(html, "").into_owned(), |text, (c, entity)| {
            text.replace(entity, &c.to_string())
        })
}
