//! `docco translations` subcommand group.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use docco_config::Config;
use docco_core::DocumentBuilder;
use docco_i18n::{CatalogSet, MergeReport};
use docco_renderer::HtmlEngine;

use super::{Document, build_options};
use crate::error::CliError;
use crate::output::Output;

/// Translation catalog commands.
#[derive(Subcommand)]
pub(crate) enum TranslationsCommand {
    /// Regenerate the template and merge every language catalog.
    Update(DocumentArgs),
    /// Show translation progress of every language catalog.
    Status(DocumentArgs),
    /// Create a catalog for a new language.
    Init(InitArgs),
}

#[derive(Args)]
pub(crate) struct DocumentArgs {
    /// Path to the markdown document.
    file: PathBuf,
}

#[derive(Args)]
pub(crate) struct InitArgs {
    /// Path to the markdown document.
    file: PathBuf,

    /// Language code, e.g. NL.
    language: String,
}

impl TranslationsCommand {
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let config = Config::load(config_path, None)?;
        let output = Output::new();
        match self {
            Self::Update(args) => update(&config, &args.file, &output),
            Self::Status(args) => status(&config, &args.file, &output),
            Self::Init(args) => init(&config, &args.file, &args.language, &output),
        }
    }
}

fn update(config: &Config, file: &Path, output: &Output) -> Result<(), CliError> {
    let document = Document::open(file)?;
    let reports = DocumentBuilder::new(&document.store, &HtmlEngine)
        .with_options(build_options(config, None))
        .update_translations(&document.name)?;

    let set = CatalogSet::new(&document.store, &document.name);
    output.info(&format!(
        "Wrote {}",
        document.dir.join(set.template_path()).display()
    ));
    for report in &reports {
        tracing::info!(
            language = %report.language,
            added = report.added,
            removed = report.removed,
            "Catalog merged"
        );
        for line in report_lines(report) {
            output.info(&line);
        }
    }
    output.success(&format!("Updated {} catalog(s)", reports.len()));
    Ok(())
}

/// The report line as is, then the merge counts on a line of their own.
fn report_lines(report: &MergeReport) -> [String; 2] {
    [
        report.to_string(),
        format!("  {} new, {} removed", report.added, report.removed),
    ]
}

fn status(config: &Config, file: &Path, output: &Output) -> Result<(), CliError> {
    let document = Document::open(file)?;
    let statuses = DocumentBuilder::new(&document.store, &HtmlEngine)
        .with_options(build_options(config, None))
        .translation_status(&document.name)?;

    if statuses.is_empty() {
        let set = CatalogSet::new(&document.store, &document.name);
        output.info(&format!(
            "No catalogs in {}",
            document.dir.join(set.dir()).display()
        ));
        return Ok(());
    }

    output.heading(&format!("Translations of {}", file.display()));
    for status in &statuses {
        let line = format!("{}: {}", status.language, status.stats);
        if !status.in_sync {
            output.warning(&format!("{line} (out of sync, run translations update)"));
        } else if status.stats.is_complete() {
            output.success(&line);
        } else {
            output.info(&line);
        }
    }
    Ok(())
}

fn init(config: &Config, file: &Path, language: &str, output: &Output) -> Result<(), CliError> {
    let valid = !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(CliError::Validation(format!(
            "invalid language code: {language:?}"
        )));
    }

    let document = Document::open(file)?;
    let created = DocumentBuilder::new(&document.store, &HtmlEngine)
        .with_options(build_options(config, None))
        .init_translation(&document.name, language)?;

    let path = document
        .dir
        .join(CatalogSet::new(&document.store, &document.name).catalog_path(language));
    if created {
        output.success(&format!("Created {}", path.display()));
    } else {
        output.warning(&format!("{} already exists, left unchanged", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use docco_i18n::CatalogStats;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_report_line_printed_unchanged() {
        let report = MergeReport {
            language: "NL".to_owned(),
            stats: CatalogStats {
                translated: 3,
                fuzzy: 1,
                untranslated: 2,
            },
            added: 2,
            removed: 1,
            in_sync: false,
        };
        assert_eq!(
            report_lines(&report),
            [
                "Updated NL: 3 translated, 1 fuzzy, 2 untranslated".to_owned(),
                "  2 new, 1 removed".to_owned(),
            ]
        );
    }
}
