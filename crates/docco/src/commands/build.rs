//! `docco build` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docco_config::{CliSettings, Config};
use docco_core::DocumentBuilder;
use docco_directives::ExecPolicy;
use docco_i18n::po;

use super::{Document, build_options, engine};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to the markdown document.
    file: PathBuf,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Run executable fragments (overrides config).
    #[arg(long, conflicts_with = "deny_exec")]
    allow_exec: bool,

    /// Fail on executable fragments instead of skipping them.
    #[arg(long)]
    deny_exec: bool,

    /// Also write the expanded markdown and HTML of every language.
    #[arg(long)]
    keep_intermediate: bool,

    /// Render languages in parallel.
    #[arg(long)]
    parallel: bool,

    /// Translate a single-language document with this catalog.
    #[arg(long, value_name = "PO_FILE")]
    po: Option<PathBuf>,
}

impl BuildArgs {
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            output_dir: self.output_dir.clone(),
            allow_exec: self.allow_exec.then_some(true),
            keep_intermediate: self.keep_intermediate.then_some(true),
            parallel: self.parallel.then_some(true),
        };
        let config = Config::load(config_path, Some(&cli_settings))?;

        let document = Document::open(&self.file)?;
        let catalog = self.po.as_deref().map(po::read_file).transpose()?;
        let exec = self.deny_exec.then_some(ExecPolicy::Deny);
        let engine = engine(&config, &document.dir);
        tracing::debug!(
            document = %self.file.display(),
            output_dir = %config.build.output_dir.display(),
            catalog = self.po.is_some(),
            "Resolved build settings"
        );

        output.info(&format!("Building {}...", self.file.display()));
        let build = DocumentBuilder::new(&document.store, &*engine)
            .with_options(build_options(&config, exec))
            .build(&document.name, catalog)?;

        for report in &build.reports {
            output.info(&report.to_string());
        }

        let output_dir = &config.build.output_dir;
        let written = build.write(output_dir)?;
        for path in &written {
            output.file(path);
        }

        tracing::info!(
            files = written.len(),
            languages = build.languages.len(),
            warnings = build.warnings.len(),
            "Build finished"
        );
        if !build.warnings.is_empty() {
            output.warning(&format!("{} warning(s)", build.warnings.len()));
        }
        output.success(&format!(
            "Built {} file(s) in {}",
            written.len(),
            output_dir.display()
        ));
        Ok(())
    }
}
