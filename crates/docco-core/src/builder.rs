//! Document build pipeline.
//!
//! One build runs these stages:
//!
//! ```text
//! read -> frontmatter -> expand (once)
//!      -> [multilingual] filter(base) -> convert -> extract -> merge catalogs (once)
//!      -> per language: filter -> convert -> apply -> number -> layout -> render
//! ```
//!
//! Every language is rendered in memory first; nothing is written unless
//! all languages succeed.

use std::path::{Path, PathBuf};

use docco_directives::{
    ExpanderConfig, Expander, Expansion, ExpansionContext, FilterError, FragmentKind,
    check_language_blocks, declared_languages, filter_language,
};
use docco_i18n::{
    Catalog, CatalogSet, CatalogStats, CatalogStatus, MergeOptions, MergeReport, apply, extract,
};
use docco_renderer::{
    Markup, Numbering, NumberingConfig, RenderEngine, Stylesheet, convert, layout, wrap_html,
};
use docco_storage::FragmentStore;
use rayon::prelude::*;

use crate::error::BuildError;
use crate::frontmatter::{self, Frontmatter};
use crate::stylesheet;

/// Build settings.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directive expansion settings.
    pub expander: ExpanderConfig,
    /// Heading numbering settings.
    pub numbering: NumberingConfig,
    /// Catalog merge settings.
    pub merge: MergeOptions,
    /// Also produce the filtered markdown and HTML of every language.
    pub keep_intermediate: bool,
    /// Render languages on the rayon thread pool.
    pub parallel: bool,
}

impl BuildOptions {
    #[must_use]
    pub fn with_expander(mut self, expander: ExpanderConfig) -> Self {
        self.expander = expander;
        self
    }

    #[must_use]
    pub fn with_numbering(mut self, numbering: NumberingConfig) -> Self {
        self.numbering = numbering;
        self
    }

    #[must_use]
    pub fn with_merge(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }

    #[must_use]
    pub fn with_keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A document after frontmatter parsing and directive expansion.
#[derive(Debug)]
pub struct Prepared {
    /// Document path relative to the store root.
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub expansion: Expansion,
}

impl Prepared {
    /// File stem used for output and catalog names.
    #[must_use]
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Base language code (uppercased) from frontmatter.
    #[must_use]
    pub fn base_language(&self) -> Option<String> {
        self.frontmatter
            .base_language
            .as_deref()
            .map(str::to_uppercase)
    }
}

/// A rendered file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Result of a successful build. Nothing has been written yet.
#[derive(Debug, Default)]
pub struct Build {
    /// Output documents, then intermediates, per language.
    pub files: Vec<OutputFile>,
    /// Languages built, in build order. Empty for a single-language build.
    pub languages: Vec<String>,
    /// Catalog merge reports of a multilingual build.
    pub reports: Vec<MergeReport>,
    /// Non-fatal problems found while building.
    pub warnings: Vec<String>,
}

impl Build {
    /// Write every file into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Output`] on the first file that can't be written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        std::fs::create_dir_all(dir).map_err(|source| BuildError::Output {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.name);
            std::fs::write(&path, &file.content).map_err(|source| BuildError::Output {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), bytes = file.content.len(), "Wrote output");
            written.push(path);
        }
        Ok(written)
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// One language to render.
struct Job<'c> {
    language: Option<String>,
    catalog: Option<&'c Catalog>,
    suffix: String,
}

/// Runs the pipeline for documents in a fragment store.
pub struct DocumentBuilder<'a> {
    store: &'a dyn FragmentStore,
    engine: &'a dyn RenderEngine,
    options: BuildOptions,
}

impl<'a> DocumentBuilder<'a> {
    /// Create a builder reading from `store` and rendering with `engine`.
    #[must_use]
    pub fn new(store: &'a dyn FragmentStore, engine: &'a dyn RenderEngine) -> Self {
        Self {
            store,
            engine,
            options: BuildOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Read `document`, split off its frontmatter and expand directives.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the document can't be read, its frontmatter
    /// is invalid, or expansion fails.
    pub fn prepare(&self, document: &Path) -> Result<Prepared, BuildError> {
        tracing::info!(document = %document.display(), "Processing document");
        let text = self.store.read(document)?;
        let (frontmatter, body) =
            frontmatter::split(&text).map_err(|source| BuildError::Frontmatter {
                path: document.to_path_buf(),
                source,
            })?;

        let expander = Expander::new(self.store, self.options.expander.clone());
        let expansion = expander.expand(body, &ExpansionContext::root(document))?;
        tracing::debug!(
            passes = expansion.passes,
            fragments = expansion.fragments.len(),
            "Expanded directives"
        );

        Ok(Prepared {
            path: document.to_path_buf(),
            frontmatter,
            expansion,
        })
    }

    /// Build `document`.
    ///
    /// A multilingual document (frontmatter `multilingual: true`) produces
    /// `<stem>_<LANG>` outputs for the base language and every catalog
    /// language, updating the catalogs first. Otherwise one `<stem>` output
    /// is produced, filtered for and translated with `catalog` if given.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] of any stage or language.
    pub fn build(&self, document: &Path, catalog: Option<Catalog>) -> Result<Build, BuildError> {
        let prepared = self.prepare(document)?;
        let mut build = Build::default();
        build.warnings.extend(prepared.expansion.warnings.iter().cloned());
        let stylesheet = stylesheet::collect(self.store, prepared.dir(), &prepared.frontmatter.css)?;

        if prepared.frontmatter.multilingual {
            if catalog.is_some() {
                build.warn(
                    "Ignoring the catalog option: multilingual documents use their own catalogs"
                        .to_owned(),
                );
            }
            self.build_multilingual(&prepared, &stylesheet, &mut build)?;
        } else {
            self.build_single(&prepared, catalog, &stylesheet, &mut build)?;
        }

        tracing::info!(
            files = build.files.len(),
            languages = build.languages.len(),
            "Build finished"
        );
        Ok(build)
    }

    fn build_single(
        &self,
        prepared: &Prepared,
        catalog: Option<Catalog>,
        stylesheet: &Stylesheet,
        build: &mut Build,
    ) -> Result<(), BuildError> {
        let language = catalog
            .as_ref()
            .and_then(|c| c.language().map(str::to_owned))
            .or_else(|| prepared.base_language());

        if language.is_none() {
            let declared = self.declared(prepared)?;
            if !declared.is_empty() {
                build.warn(format!(
                    "Document has language blocks ({}) but no language is selected; keeping all of them",
                    declared.join(", ")
                ));
            }
        }
        if let Some(catalog) = &catalog {
            let stats = catalog.stats();
            if !stats.is_complete() {
                build.warn(incomplete_message(catalog.language().unwrap_or_default(), &stats));
            }
        }

        let job = Job {
            language,
            catalog: catalog.as_ref(),
            suffix: String::new(),
        };
        build.files = self.render(prepared, &job, stylesheet)?;
        Ok(())
    }

    fn build_multilingual(
        &self,
        prepared: &Prepared,
        stylesheet: &Stylesheet,
        build: &mut Build,
    ) -> Result<(), BuildError> {
        let base = prepared
            .base_language()
            .ok_or_else(|| BuildError::MissingBaseLanguage {
                path: prepared.path.clone(),
            })?;
        tracing::info!(language = %base, "Processing base language");

        let template = self.template(prepared)?;
        let merged = CatalogSet::new(self.store, &prepared.path)
            .update(&template, &self.options.merge)?;

        for (_, report) in &merged {
            let language = &report.language;
            if !report.in_sync {
                build.warn(format!(
                    "PO file out of sync for {language}: document has changed. PO files are automatically updated on each build."
                ));
            }
            if !report.stats.is_complete() {
                build.warn(incomplete_message(language, &report.stats));
            }
        }

        let declared = self.declared(prepared)?;
        for code in declared
            .iter()
            .filter(|code| **code != base && !merged.iter().any(|(_, r)| &r.language == *code))
        {
            build.warn(format!(
                "Language {code} has content blocks but no catalog; run translations init to add it"
            ));
        }

        let mut jobs = vec![Job {
            language: Some(base.clone()),
            catalog: None,
            suffix: format!("_{base}"),
        }];
        for (catalog, report) in &merged {
            if report.language == base {
                continue;
            }
            jobs.push(Job {
                language: Some(report.language.clone()),
                catalog: Some(catalog),
                suffix: format!("_{}", report.language),
            });
        }

        let rendered: Vec<Vec<OutputFile>> = if self.options.parallel {
            jobs.par_iter()
                .map(|job| self.render(prepared, job, stylesheet))
                .collect::<Result<_, _>>()?
        } else {
            jobs.iter()
                .map(|job| self.render(prepared, job, stylesheet))
                .collect::<Result<_, _>>()?
        };

        build.languages = jobs.iter().filter_map(|job| job.language.clone()).collect();
        build.files = rendered.into_iter().flatten().collect();
        build.reports = merged.into_iter().map(|(_, report)| report).collect();
        Ok(())
    }

    /// Render one language; catalogs are only read here.
    fn render(
        &self,
        prepared: &Prepared,
        job: &Job<'_>,
        stylesheet: &Stylesheet,
    ) -> Result<Vec<OutputFile>, BuildError> {
        let language = job.language.as_deref();
        let result = self.render_language(prepared, job, stylesheet);
        match language {
            Some(lang) => result.map_err(|e| e.for_language(lang)),
            None => result,
        }
    }

    fn render_language(
        &self,
        prepared: &Prepared,
        job: &Job<'_>,
        stylesheet: &Stylesheet,
    ) -> Result<Vec<OutputFile>, BuildError> {
        if let Some(language) = &job.language {
            tracing::info!(language = %language, "Rendering language");
        }
        let text = self.filtered(prepared, job.language.as_deref())?;
        let mut markup = convert(&text);
        if let Some(catalog) = job.catalog {
            markup = apply(markup, catalog);
        }
        let numbered = Numbering::new(self.options.numbering).number(markup);
        let markup = layout::annotate(numbered.markup);
        let content = self.engine.render(&markup, stylesheet)?;

        let base_name = format!("{}{}", prepared.stem(), job.suffix);
        let extension = self.engine.extension();
        let mut files = vec![OutputFile {
            name: format!("{base_name}.{extension}"),
            content,
        }];
        if self.options.keep_intermediate {
            files.push(OutputFile {
                name: format!("{base_name}_intermediate.md"),
                content: text.into_bytes(),
            });
            if extension != "html" {
                files.push(OutputFile {
                    name: format!("{base_name}.html"),
                    content: wrap_html(&markup.to_html(), stylesheet).into_bytes(),
                });
            }
        }
        Ok(files)
    }

    /// Expanded text filtered for `language`; unfiltered without one.
    fn filtered(&self, prepared: &Prepared, language: Option<&str>) -> Result<String, BuildError> {
        let text = &prepared.expansion.text;
        match language {
            Some(language) => {
                filter_language(text, language).map_err(|e| self.locate_filter_error(prepared, e))
            }
            None => Ok(text.clone()),
        }
    }

    fn declared(&self, prepared: &Prepared) -> Result<Vec<String>, BuildError> {
        declared_languages(&prepared.expansion.text)
            .map_err(|e| self.locate_filter_error(prepared, e))
    }

    /// Point a language block error at the file that holds the block.
    ///
    /// The document and each included fragment are checked on their own and
    /// the first one that is malformed is reported with its own line. When
    /// every file is balanced the block crosses a fragment boundary and only
    /// the expanded text has a line for it.
    fn locate_filter_error(&self, prepared: &Prepared, source: FilterError) -> BuildError {
        let interpreters = &self.options.expander.interpreters;
        let fragments = prepared.expansion.fragments.iter().filter(|fragment| {
            !matches!(
                FragmentKind::from_path(fragment, interpreters),
                Some(FragmentKind::Executable { .. })
            )
        });
        for path in std::iter::once(&prepared.path).chain(fragments) {
            let Ok(text) = self.store.read(path) else {
                continue;
            };
            if let Err(source) = check_language_blocks(&text) {
                return BuildError::Filter {
                    path: path.clone(),
                    source,
                };
            }
        }
        BuildError::FilterExpanded {
            path: prepared.path.clone(),
            source,
        }
    }

    /// Base-language markup of a prepared document, before numbering.
    fn base_markup(&self, prepared: &Prepared) -> Result<Markup, BuildError> {
        let text = self.filtered(prepared, prepared.base_language().as_deref())?;
        Ok(convert(&text))
    }

    /// Template catalog extracted from the base-language markup.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Filter`] or [`BuildError::FilterExpanded`] for
    /// malformed language blocks.
    pub fn template(&self, prepared: &Prepared) -> Result<Catalog, BuildError> {
        Ok(extract(&self.base_markup(prepared)?))
    }

    /// Regenerate the template of `document` and merge its catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if preparation fails or a catalog is malformed;
    /// no catalog is written in that case.
    pub fn update_translations(&self, document: &Path) -> Result<Vec<MergeReport>, BuildError> {
        let prepared = self.prepare(document)?;
        let template = self.template(&prepared)?;
        let merged = CatalogSet::new(self.store, document).update(&template, &self.options.merge)?;
        Ok(merged.into_iter().map(|(_, report)| report).collect())
    }

    /// Stats and sync state of the catalogs of `document`.
    ///
    /// Compares against a freshly extracted template; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if preparation fails or a catalog is malformed.
    pub fn translation_status(&self, document: &Path) -> Result<Vec<CatalogStatus>, BuildError> {
        let prepared = self.prepare(document)?;
        let template = self.template(&prepared)?;
        Ok(CatalogSet::new(self.store, document).status(&template)?)
    }

    /// Create an untranslated catalog for `language`.
    ///
    /// Returns `false` if one already exists.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if preparation fails or the catalog can't be
    /// written.
    pub fn init_translation(&self, document: &Path, language: &str) -> Result<bool, BuildError> {
        let prepared = self.prepare(document)?;
        let template = self.template(&prepared)?;
        Ok(CatalogSet::new(self.store, document).init(language, &template)?)
    }
}

fn incomplete_message(language: &str, stats: &CatalogStats) -> String {
    format!(
        "Translation incomplete for {language}: {} untranslated, {} fuzzy",
        stats.untranslated, stats.fuzzy
    )
}
