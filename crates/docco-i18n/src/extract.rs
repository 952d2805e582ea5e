//! Moving text between markup and catalogs.

use docco_renderer::Markup;

use crate::catalog::{Catalog, TranslationUnit};

/// Build a template catalog from converted, unnumbered markup.
///
/// Every heading and text block contributes its trimmed inner HTML as one
/// untranslated unit. Identical texts share a unit; empty ones are skipped.
#[must_use]
pub fn extract(markup: &Markup) -> Catalog {
    let mut catalog = Catalog::new();
    for text in markup.text_units() {
        let msgid = text.trim();
        if !msgid.is_empty() && !catalog.contains(msgid) {
            catalog.insert(TranslationUnit::new(msgid));
        }
    }
    tracing::debug!(units = catalog.len(), "Extracted translation units");
    catalog
}

/// Substitute translations into `markup`.
///
/// Units whose translation is missing keep their source text.
#[must_use]
pub fn apply(mut markup: Markup, catalog: &Catalog) -> Markup {
    let replaced = markup.map_text(|text| catalog.translation(text.trim()).map(str::to_owned));
    tracing::debug!(
        language = catalog.language().unwrap_or_default(),
        replaced,
        "Applied translations"
    );
    markup
}
