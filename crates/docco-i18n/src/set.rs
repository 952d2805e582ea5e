//! Catalog files of one document.
//!
//! For a document `manual.md` the catalogs live next to it:
//!
//! ```text
//! manual.md
//! manual/
//!   manual.pot   template, regenerated on every update
//!   nl.po        one catalog per language
//!   de.po
//! ```

use std::path::{Path, PathBuf};

use docco_storage::FragmentStore;

use crate::catalog::{Catalog, CatalogStats};
use crate::error::CatalogError;
use crate::merge::{MergeOptions, MergeReport, check_sync, merge};
use crate::po;

/// Translation state of one language catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    pub language: String,
    pub stats: CatalogStats,
    /// Whether the catalog has exactly the template's units.
    pub in_sync: bool,
}

/// The template and language catalogs of one document.
pub struct CatalogSet<'a> {
    store: &'a dyn FragmentStore,
    dir: PathBuf,
    stem: String,
}

impl<'a> CatalogSet<'a> {
    /// Catalogs of `document`, a path relative to the store root.
    #[must_use]
    pub fn new(store: &'a dyn FragmentStore, document: &Path) -> Self {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = document
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf)
            .join(&stem);
        Self { store, dir, stem }
    }

    /// Directory holding the catalogs.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the template (`<stem>/<stem>.pot`).
    #[must_use]
    pub fn template_path(&self) -> PathBuf {
        self.dir.join(format!("{}.pot", self.stem))
    }

    /// Path of the catalog for `language`.
    #[must_use]
    pub fn catalog_path(&self, language: &str) -> PathBuf {
        self.dir.join(format!("{}.po", language.to_lowercase()))
    }

    /// Language codes with a catalog, uppercased and sorted.
    pub fn languages(&self) -> Result<Vec<String>, CatalogError> {
        let mut languages: Vec<String> = self
            .store
            .list(&self.dir, "po")?
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().to_uppercase())
            .collect();
        languages.sort();
        Ok(languages)
    }

    /// Read the stored template, if any.
    pub fn load_template(&self) -> Result<Option<Catalog>, CatalogError> {
        let path = self.template_path();
        if !self.store.exists(&path) {
            return Ok(None);
        }
        let text = self.store.read(&path)?;
        po::parse(&text, &path).map(Some)
    }

    /// Read the catalog of `language`.
    pub fn load(&self, language: &str) -> Result<Catalog, CatalogError> {
        let path = self.catalog_path(language);
        let text = self.store.read(&path)?;
        let catalog = po::parse(&text, &path)?;
        tracing::debug!(path = %path.display(), units = catalog.len(), "Loaded catalog");
        Ok(catalog.with_language(language.to_uppercase()))
    }

    /// Read every language catalog.
    pub fn load_all(&self) -> Result<Vec<Catalog>, CatalogError> {
        self.languages()?
            .iter()
            .map(|language| self.load(language))
            .collect()
    }

    /// Write `template` and merge every language catalog against it.
    ///
    /// All catalogs are read and merged before anything is written, so a
    /// malformed catalog leaves every file untouched. Returns the merged
    /// catalogs with their reports, ordered by language.
    pub fn update(
        &self,
        template: &Catalog,
        options: &MergeOptions,
    ) -> Result<Vec<(Catalog, MergeReport)>, CatalogError> {
        let merged: Vec<(Catalog, MergeReport)> = self
            .load_all()?
            .iter()
            .map(|old| merge(old, template, options))
            .collect();

        self.store
            .write(&self.template_path(), &po::to_string(template))?;
        for (catalog, report) in &merged {
            self.store
                .write(&self.catalog_path(&report.language), &po::to_string(catalog))?;
            tracing::info!(
                language = %report.language,
                added = report.added,
                removed = report.removed,
                "Updated catalog"
            );
        }
        Ok(merged)
    }

    /// Create an untranslated catalog for `language` from `template`.
    ///
    /// Returns `false` if the catalog already exists; it is left untouched.
    pub fn init(&self, language: &str, template: &Catalog) -> Result<bool, CatalogError> {
        let path = self.catalog_path(language);
        if self.store.exists(&path) {
            return Ok(false);
        }
        let empty = Catalog::new().with_language(language.to_uppercase());
        let (catalog, _) = merge(&empty, template, &MergeOptions::default());
        self.store.write(&path, &po::to_string(&catalog))?;
        tracing::info!(path = %path.display(), units = catalog.len(), "Created catalog");
        Ok(true)
    }

    /// Stats and sync state of every language catalog against `template`.
    pub fn status(&self, template: &Catalog) -> Result<Vec<CatalogStatus>, CatalogError> {
        Ok(self
            .load_all()?
            .iter()
            .map(|catalog| CatalogStatus {
                language: catalog.language().unwrap_or_default().to_owned(),
                stats: catalog.stats(),
                in_sync: check_sync(template, catalog),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use docco_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::TranslationUnit;

    const NL: &str = "msgid \"Hello\"\nmsgstr \"Hallo\"\n\nmsgid \"Old\"\nmsgstr \"Oud\"\n";

    fn template() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(TranslationUnit::new("Hello"));
        catalog.insert(TranslationUnit::new("World"));
        catalog
    }

    #[test]
    fn test_paths() {
        let store = MemoryStore::new();
        let set = CatalogSet::new(&store, Path::new("guides/manual.md"));
        assert_eq!(set.template_path(), PathBuf::from("guides/manual/manual.pot"));
        assert_eq!(set.catalog_path("NL"), PathBuf::from("guides/manual/nl.po"));
    }

    #[test]
    fn test_languages() {
        let store = MemoryStore::new()
            .with_file("manual/nl.po", NL)
            .with_file("manual/de.po", "")
            .with_file("manual/manual.pot", "");
        let set = CatalogSet::new(&store, Path::new("manual.md"));
        assert_eq!(set.languages().unwrap(), vec!["DE", "NL"]);
    }

    #[test]
    fn test_load_sets_language() {
        let store = MemoryStore::new().with_file("manual/nl.po", NL);
        let set = CatalogSet::new(&store, Path::new("manual.md"));
        let catalog = set.load("NL").unwrap();
        assert_eq!(catalog.language(), Some("NL"));
        assert_eq!(catalog.translation("Hello"), Some("Hallo"));
    }

    #[test]
    fn test_missing_template() {
        let store = MemoryStore::new();
        let set = CatalogSet::new(&store, Path::new("manual.md"));
        assert!(set.load_template().unwrap().is_none());
    }

    #[test]
    fn test_update_writes_template_and_catalogs() {
        let store = MemoryStore::new().with_file("manual/nl.po", NL);
        let set = CatalogSet::new(&store, Path::new("manual.md"));

        let updated = set.update(&template(), &MergeOptions::default()).unwrap();
        assert_eq!(updated.len(), 1);
        let (merged, report) = &updated[0];
        assert_eq!(merged.language(), Some("NL"));
        assert!(!report.in_sync);
        assert_eq!(
            report.to_string(),
            "Updated NL: 1 translated, 0 fuzzy, 1 untranslated"
        );

        assert_eq!(set.load_template().unwrap().unwrap(), template());
        let nl = set.load("NL").unwrap();
        assert_eq!(nl.translation("Hello"), Some("Hallo"));
        assert!(nl.get("Old").is_none());
        assert!(check_sync(&template(), &nl));
    }

    #[test]
    fn test_update_malformed_catalog_writes_nothing() {
        let store = MemoryStore::new()
            .with_file("manual/nl.po", NL)
            .with_file("manual/de.po", "msgctxt \"x\"\n");
        let set = CatalogSet::new(&store, Path::new("manual.md"));

        let err = set.update(&template(), &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedCatalog { line: 1, .. }));
        assert!(store.get("manual/manual.pot").is_none());
        assert_eq!(store.get("manual/nl.po").unwrap(), NL);
    }

    #[test]
    fn test_init() {
        let store = MemoryStore::new().with_file("manual/nl.po", NL);
        let set = CatalogSet::new(&store, Path::new("manual.md"));

        assert!(set.init("FR", &template()).unwrap());
        let fr = set.load("FR").unwrap();
        assert_eq!(fr.stats().untranslated, 2);

        assert!(!set.init("nl", &template()).unwrap());
        assert_eq!(store.get("manual/nl.po").unwrap(), NL);
    }

    #[test]
    fn test_status() {
        let store = MemoryStore::new().with_file("manual/nl.po", NL);
        let set = CatalogSet::new(&store, Path::new("manual.md"));
        let status = set.status(&template()).unwrap();
        assert_eq!(
            status,
            vec![CatalogStatus {
                language: "NL".to_owned(),
                stats: CatalogStats {
                    translated: 2,
                    fuzzy: 0,
                    untranslated: 0,
                },
                in_sync: false,
            }]
        );
    }
}
