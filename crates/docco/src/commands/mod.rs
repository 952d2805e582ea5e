//! CLI command implementations.

mod build;
mod translations;

use std::path::{Path, PathBuf};
use std::time::Duration;

use docco_config::{Config, EngineKind};
use docco_core::BuildOptions;
use docco_directives::{ExecPolicy, ExpanderConfig, Interpreters};
use docco_i18n::MergeOptions;
use docco_renderer::{CommandEngine, HtmlEngine, NumberingConfig, RenderEngine};
use docco_storage::FsStore;

use crate::error::CliError;

pub(crate) use build::BuildArgs;
pub(crate) use translations::TranslationsCommand;

/// A document opened from the command line.
///
/// Fragments and catalogs resolve against the document's directory.
pub(crate) struct Document {
    pub(crate) store: FsStore,
    /// File name within the store.
    pub(crate) name: PathBuf,
    pub(crate) dir: PathBuf,
}

impl Document {
    pub(crate) fn open(file: &Path) -> Result<Self, CliError> {
        if !file.is_file() {
            return Err(CliError::Validation(format!(
                "document not found: {}",
                file.display()
            )));
        }
        let name = file
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| CliError::Validation(format!("not a file: {}", file.display())))?;
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            store: FsStore::new(dir.clone()),
            name,
            dir,
        })
    }
}

/// Build settings from configuration.
///
/// `exec` overrides the policy derived from `directives.allow_exec`.
pub(crate) fn build_options(config: &Config, exec: Option<ExecPolicy>) -> BuildOptions {
    let directives = &config.directives;
    let mut interpreters = Interpreters::new();
    for (extension, command) in directives.interpreter_commands() {
        interpreters.insert(&extension, command);
    }
    let policy = exec.unwrap_or(if directives.allow_exec {
        ExecPolicy::Allow
    } else {
        ExecPolicy::Skip
    });

    BuildOptions::default()
        .with_expander(
            ExpanderConfig::default()
                .with_max_depth(directives.max_depth)
                .with_max_passes(directives.max_passes)
                .with_exec_policy(policy)
                .with_exec_timeout(Duration::from_secs(directives.exec_timeout_secs))
                .with_interpreters(interpreters),
        )
        .with_numbering(
            NumberingConfig::default()
                .with_max_level(config.toc.max_level)
                .with_cascade_exclude(config.toc.cascade_exclude),
        )
        .with_merge(MergeOptions::default().with_keep_obsolete(config.translations.keep_obsolete))
        .with_keep_intermediate(config.build.keep_intermediate)
        .with_parallel(config.build.parallel)
}

/// Render engine from configuration, running in `dir`.
pub(crate) fn engine(config: &Config, dir: &Path) -> Box<dyn RenderEngine> {
    match config.render.engine {
        EngineKind::Html => Box::new(HtmlEngine),
        EngineKind::Command => Box::new(
            CommandEngine::new(config.render.command.clone())
                .with_extension(config.render.extension.clone())
                .with_working_dir(dir),
        ),
    }
}
