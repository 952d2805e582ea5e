//! Merging language catalogs against a fresh template.

use std::fmt;

use crate::catalog::{Catalog, CatalogStats, TranslationUnit};

/// Merge behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Keep units dropped from the template as obsolete entries.
    pub keep_obsolete: bool,
}

impl MergeOptions {
    #[must_use]
    pub fn with_keep_obsolete(mut self, keep_obsolete: bool) -> Self {
        self.keep_obsolete = keep_obsolete;
        self
    }
}

/// Outcome of merging one language catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Language code of the merged catalog.
    pub language: String,
    /// Unit counts after the merge.
    pub stats: CatalogStats,
    /// Units new in the template.
    pub added: usize,
    /// Units no longer in the template.
    pub removed: usize,
    /// Whether the catalog already matched the template before merging.
    pub in_sync: bool,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated {}: {}", self.language, self.stats)
    }
}

/// Merge `old` against `template`.
///
/// Keyed on exact msgid: a unit present in both keeps its translation,
/// fuzzy flag and comments; a unit only in the template is added
/// untranslated (or revived from an obsolete entry); a unit only in `old`
/// is dropped, or kept as obsolete with [`MergeOptions::keep_obsolete`].
#[must_use]
pub fn merge(old: &Catalog, template: &Catalog, options: &MergeOptions) -> (Catalog, MergeReport) {
    let mut merged = Catalog::new();
    if let Some(language) = old.language() {
        merged = merged.with_language(language);
    }

    let mut added = 0;
    for msgid in template.msgids() {
        if let Some(unit) = old.get(msgid) {
            merged.insert(unit.clone());
        } else if let Some(unit) = old.get_obsolete(msgid) {
            merged.insert(unit.clone());
        } else {
            merged.insert(TranslationUnit::new(msgid));
            added += 1;
        }
    }

    let mut removed = 0;
    for unit in old.units().filter(|u| !template.contains(&u.msgid)) {
        removed += 1;
        if options.keep_obsolete {
            merged.insert_obsolete(unit.clone());
        }
    }
    if options.keep_obsolete {
        for unit in old.obsolete().filter(|u| !template.contains(&u.msgid)) {
            merged.insert_obsolete(unit.clone());
        }
    }

    let report = MergeReport {
        language: old.language().unwrap_or_default().to_owned(),
        stats: merged.stats(),
        added,
        removed,
        in_sync: check_sync(template, old),
    };
    tracing::debug!(
        language = %report.language,
        added,
        removed,
        "Merged catalog"
    );
    (merged, report)
}

/// Whether `catalog` has exactly the template's msgids.
#[must_use]
pub fn check_sync(template: &Catalog, catalog: &Catalog) -> bool {
    template.len() == catalog.len() && template.msgids().eq(catalog.msgids())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn template(ids: &[&str]) -> Catalog {
        let mut catalog = Catalog::new();
        for id in ids {
            catalog.insert(TranslationUnit::new(*id));
        }
        catalog
    }

    fn old() -> Catalog {
        let mut catalog = Catalog::new().with_language("NL");
        catalog.insert(TranslationUnit::translated("Hello", "Hallo"));
        let mut fuzzy = TranslationUnit::translated("World", "Wereld").with_fuzzy();
        fuzzy.comments.push("check".to_owned());
        catalog.insert(fuzzy);
        catalog.insert(TranslationUnit::translated("Removed", "Verwijderd"));
        catalog
    }

    #[test]
    fn test_merge_keeps_common_units() {
        let (merged, report) = merge(&old(), &template(&["Hello", "World"]), &MergeOptions::default());
        assert_eq!(merged.get("Hello"), old().get("Hello"));
        assert_eq!(merged.get("World"), old().get("World"));
        assert_eq!(merged.language(), Some("NL"));
        assert_eq!(report.added, 0);
        assert_eq!(report.removed, 1);
        assert!(!report.in_sync);
    }

    #[test]
    fn test_merge_in_sync_catalog() {
        let (merged, report) = merge(&old(), &template(&["Hello", "World", "Removed"]), &MergeOptions::default());
        assert!(report.in_sync);
        assert_eq!(merged, old());
    }

    #[test]
    fn test_merge_adds_new_units_untranslated() {
        let (merged, report) = merge(&old(), &template(&["Hello", "Brand new"]), &MergeOptions::default());
        let unit = merged.get("Brand new").unwrap();
        assert_eq!(unit.msgstr, "");
        assert!(!unit.fuzzy);
        assert_eq!(report.added, 1);
        assert_eq!(report.stats.untranslated, 1);
    }

    #[test]
    fn test_merge_changed_source_is_new() {
        let (merged, _) = merge(&old(), &template(&["Hello!"]), &MergeOptions::default());
        assert_eq!(merged.get("Hello!").unwrap().msgstr, "");
        assert!(merged.get("Hello").is_none());
        assert_eq!(merged.obsolete().count(), 0);
    }

    #[test]
    fn test_merge_keep_obsolete() {
        let options = MergeOptions::default().with_keep_obsolete(true);
        let (merged, _) = merge(&old(), &template(&["Hello"]), &options);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get_obsolete("Removed").unwrap().msgstr, "Verwijderd");
        assert!(merged.get_obsolete("World").unwrap().fuzzy);
    }

    #[test]
    fn test_merge_revives_obsolete() {
        let mut catalog = Catalog::new().with_language("DE");
        catalog.insert_obsolete(TranslationUnit::translated("Back", "Zurück"));
        let (merged, report) = merge(&catalog, &template(&["Back"]), &MergeOptions::default());
        assert_eq!(merged.translation("Back"), Some("Zurück"));
        assert_eq!(merged.obsolete().count(), 0);
        assert_eq!(report.added, 0);
    }

    #[test]
    fn test_report_line() {
        let (_, report) = merge(&old(), &template(&["Hello", "World", "New"]), &MergeOptions::default());
        assert_eq!(
            report.to_string(),
            "Updated NL: 1 translated, 1 fuzzy, 1 untranslated"
        );
    }

    #[test]
    fn test_merge_empty_old_catalog() {
        let empty = Catalog::new().with_language("FR");
        let (merged, report) = merge(&empty, &template(&["a", "b"]), &MergeOptions::default());
        assert_eq!(merged.stats().untranslated, 2);
        assert_eq!(report.added, 2);
    }

    #[test]
    fn test_check_sync() {
        let tpl = template(&["Hello", "World"]);
        let (merged, _) = merge(&old(), &tpl, &MergeOptions::default());
        assert!(check_sync(&tpl, &merged));
        assert!(!check_sync(&tpl, &old()));
        assert!(!check_sync(&template(&["Hello"]), &merged));
    }
}
