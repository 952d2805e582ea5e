//! Translation workflow for docco documents.
//!
//! Text is extracted from converted markup into a template catalog, merged
//! into one catalog per language and substituted back before numbering:
//!
//! - [`extract`] builds the template from unnumbered markup.
//! - [`merge`] brings a language catalog in line with the template.
//! - [`apply`] substitutes translations into markup.
//! - [`po`] reads and writes the gettext files translators work with.
//! - [`CatalogSet`] locates and persists the catalogs of one document.
//!
//! # Example
//!
//! ```
//! use docco_i18n::{Catalog, MergeOptions, TranslationUnit, apply, extract, merge};
//! use docco_renderer::convert;
//!
//! let markup = convert("# Welcome\n");
//! let template = extract(&markup);
//!
//! let mut old = Catalog::new().with_language("NL");
//! old.insert(TranslationUnit::translated("Welcome", "Welkom"));
//! let (catalog, report) = merge(&old, &template, &MergeOptions::default());
//! assert_eq!(report.to_string(), "Updated NL: 1 translated, 0 fuzzy, 0 untranslated");
//!
//! assert_eq!(apply(markup, &catalog).to_html(), "<h1>Welkom</h1>");
//! ```

mod catalog;
mod error;
mod extract;
mod merge;
pub mod po;
mod set;

pub use catalog::{Catalog, CatalogStats, Status, TranslationUnit};
pub use error::CatalogError;
pub use extract::{apply, extract};
pub use merge::{MergeOptions, MergeReport, check_sync, merge};
pub use set::{CatalogSet, CatalogStatus};

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Catalog: Send, Sync, Clone);
    assert_impl_all!(CatalogError: Send, Sync, std::error::Error);
}
