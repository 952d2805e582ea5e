//! Translation units and catalogs.

use std::collections::BTreeMap;
use std::fmt;

/// Translation state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Reviewed translation.
    Translated,
    /// Translation kept as a hint; needs review.
    Fuzzy,
    /// No translation yet.
    Untranslated,
}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Source text: the serialized inner markup of one block.
    pub msgid: String,
    /// Translated text; empty when untranslated.
    pub msgstr: String,
    /// `#, fuzzy` flag.
    pub fuzzy: bool,
    /// Flags other than `fuzzy`, e.g. `no-wrap`.
    pub flags: Vec<String>,
    /// Translator comments (`# ...`).
    pub comments: Vec<String>,
    /// Previous source text (`#| msgid`), kept for translators.
    pub previous: Option<String>,
}

impl TranslationUnit {
    /// Create an untranslated unit.
    #[must_use]
    pub fn new(msgid: impl Into<String>) -> Self {
        Self {
            msgid: msgid.into(),
            ..Self::default()
        }
    }

    /// Create a translated unit.
    #[must_use]
    pub fn translated(msgid: impl Into<String>, msgstr: impl Into<String>) -> Self {
        Self {
            msgid: msgid.into(),
            msgstr: msgstr.into(),
            ..Self::default()
        }
    }

    /// Mark the unit fuzzy.
    #[must_use]
    pub fn with_fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    /// Current status. The fuzzy flag wins over a non-empty translation.
    #[must_use]
    pub fn status(&self) -> Status {
        if self.fuzzy {
            Status::Fuzzy
        } else if self.msgstr.is_empty() {
            Status::Untranslated
        } else {
            Status::Translated
        }
    }
}

/// Unit counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub translated: usize,
    pub fuzzy: usize,
    pub untranslated: usize,
}

impl CatalogStats {
    /// Total number of units.
    #[must_use]
    pub fn total(&self) -> usize {
        self.translated + self.fuzzy + self.untranslated
    }

    /// Whether every unit is translated and reviewed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fuzzy == 0 && self.untranslated == 0
    }
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} translated, {} fuzzy, {} untranslated",
            self.translated, self.fuzzy, self.untranslated
        )
    }
}

/// Units of one language, ordered by msgid.
///
/// A catalog without a language is a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    language: Option<String>,
    units: BTreeMap<String, TranslationUnit>,
    obsolete: BTreeMap<String, TranslationUnit>,
}

impl Catalog {
    /// Create an empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Language code, `None` for a template.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Add a unit, replacing any unit with the same msgid.
    pub fn insert(&mut self, unit: TranslationUnit) {
        self.units.insert(unit.msgid.clone(), unit);
    }

    /// Add an obsolete (`#~`) unit.
    pub fn insert_obsolete(&mut self, unit: TranslationUnit) {
        self.obsolete.insert(unit.msgid.clone(), unit);
    }

    /// Look up a unit by exact msgid.
    #[must_use]
    pub fn get(&self, msgid: &str) -> Option<&TranslationUnit> {
        self.units.get(msgid)
    }

    /// Look up an obsolete unit by exact msgid.
    #[must_use]
    pub fn get_obsolete(&self, msgid: &str) -> Option<&TranslationUnit> {
        self.obsolete.get(msgid)
    }

    /// Whether a unit with `msgid` exists.
    #[must_use]
    pub fn contains(&self, msgid: &str) -> bool {
        self.units.contains_key(msgid)
    }

    /// Active units, ordered by msgid.
    pub fn units(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.units.values()
    }

    /// Obsolete units, ordered by msgid.
    pub fn obsolete(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.obsolete.values()
    }

    /// Active msgids, ordered.
    pub fn msgids(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Number of active units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no active units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Translation to substitute for `msgid`: the msgstr of a translated or
    /// fuzzy unit, if non-empty.
    #[must_use]
    pub fn translation(&self, msgid: &str) -> Option<&str> {
        let unit = self.units.get(msgid)?;
        match unit.status() {
            Status::Translated | Status::Fuzzy if !unit.msgstr.is_empty() => {
                Some(unit.msgstr.as_str())
            }
            _ => None,
        }
    }

    /// Count units by status.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for unit in self.units.values() {
            match unit.status() {
                Status::Translated => stats.translated += 1,
                Status::Fuzzy => stats.fuzzy += 1,
                Status::Untranslated => stats.untranslated += 1,
            }
        }
        stats
    }
}
