//! Configuration management for docco.
//!
//! Parses `docco.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `build.output_dir`
//! - `render.command`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docco.toml";

/// Largest accepted `directives.max_depth`; configs may only lower it.
const MAX_INCLUDE_DEPTH: usize = 10;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override executable fragment permission.
    pub allow_exec: Option<bool>,
    /// Override intermediate file output.
    pub keep_intermediate: Option<bool>,
    /// Override parallel per-language rendering.
    pub parallel: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build output configuration.
    pub build: BuildConfig,
    /// Directive expansion configuration.
    pub directives: DirectivesConfig,
    /// Translation catalog configuration.
    pub translations: TranslationsConfig,
    /// Table of contents configuration.
    pub toc: TocConfig,
    /// Render engine configuration.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Build output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory. Relative paths resolve against the config file's
    /// directory, or the current directory without a config file.
    pub output_dir: PathBuf,
    /// Also write the expanded markdown and HTML of every language.
    pub keep_intermediate: bool,
    /// Render languages in parallel.
    pub parallel: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            keep_intermediate: false,
            parallel: false,
        }
    }
}

/// Directive expansion configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectivesConfig {
    /// Maximum include nesting depth.
    pub max_depth: usize,
    /// Maximum number of whole-document expansion passes.
    pub max_passes: usize,
    /// Run executable fragments.
    pub allow_exec: bool,
    /// Wall-clock limit for one executable fragment, in seconds.
    pub exec_timeout_secs: u64,
    /// Interpreter command per executable fragment extension.
    pub interpreters: BTreeMap<String, String>,
}

impl Default for DirectivesConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_passes: 10,
            allow_exec: false,
            exec_timeout_secs: 30,
            interpreters: BTreeMap::from([
                ("py".to_owned(), "python3".to_owned()),
                ("sh".to_owned(), "sh".to_owned()),
            ]),
        }
    }
}

impl DirectivesConfig {
    /// Interpreter commands split into argv.
    #[must_use]
    pub fn interpreter_commands(&self) -> BTreeMap<String, Vec<String>> {
        self.interpreters
            .iter()
            .map(|(ext, command)| {
                let argv = command.split_whitespace().map(str::to_owned).collect();
                (ext.clone(), argv)
            })
            .collect()
    }
}

/// Translation catalog configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TranslationsConfig {
    /// Keep units dropped from the template as obsolete entries.
    pub keep_obsolete: bool,
}

/// Table of contents configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Exclude the subsections of an excluded heading too.
    pub cascade_exclude: bool,
    /// Deepest numbered and listed heading level.
    pub max_level: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            cascade_exclude: false,
            max_level: 3,
        }
    }
}

/// Render engine selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Standalone HTML documents.
    #[default]
    Html,
    /// HTML piped through an external command.
    Command,
}

/// Render engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Engine used for output documents.
    pub engine: EngineKind,
    /// Command line of the command engine, e.g. `["weasyprint", "-", "-"]`.
    pub command: Vec<String>,
    /// Extension of documents produced by the command engine.
    pub extension: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            command: Vec::new(),
            extension: "pdf".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.command`").
        field: String,
        /// Error message (e.g., "${`RENDERER`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docco.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(output_dir) = &settings.output_dir {
            self.build.output_dir.clone_from(output_dir);
        }
        if let Some(allow_exec) = settings.allow_exec {
            self.directives.allow_exec = allow_exec;
        }
        if let Some(keep_intermediate) = settings.keep_intermediate {
            self.build.keep_intermediate = keep_intermediate;
        }
        if let Some(parallel) = settings.parallel {
            self.build.parallel = parallel;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_directives()?;
        self.validate_toc()?;
        self.validate_render()?;
        Ok(())
    }

    fn validate_directives(&self) -> Result<(), ConfigError> {
        let directives = &self.directives;
        if !(1..=MAX_INCLUDE_DEPTH).contains(&directives.max_depth) {
            return Err(ConfigError::Validation(format!(
                "directives.max_depth must be between 1 and {MAX_INCLUDE_DEPTH}"
            )));
        }
        if directives.max_passes == 0 {
            return Err(ConfigError::Validation(
                "directives.max_passes must be greater than 0".to_owned(),
            ));
        }
        if directives.exec_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "directives.exec_timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if let Some((ext, _)) = directives
            .interpreters
            .iter()
            .find(|(_, command)| command.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "directives.interpreters.{ext} cannot be empty"
            )));
        }
        Ok(())
    }

    fn validate_toc(&self) -> Result<(), ConfigError> {
        if !(1..=3).contains(&self.toc.max_level) {
            return Err(ConfigError::Validation(
                "toc.max_level must be between 1 and 3".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        if self.render.engine == EngineKind::Command && self.render.command.is_empty() {
            return Err(ConfigError::Validation(
                "render.command is required when render.engine = \"command\"".to_owned(),
            ));
        }
        if self.render.extension.is_empty() || self.render.extension.contains(['.', '/']) {
            return Err(ConfigError::Validation(
                "render.extension must be a bare file extension".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let output_dir = self.build.output_dir.to_string_lossy().into_owned();
        self.build.output_dir = PathBuf::from(expand::expand_env(&output_dir, "build.output_dir")?);

        for (index, arg) in self.render.command.iter_mut().enumerate() {
            *arg = expand::expand_env(arg, &format!("render.command[{index}]"))?;
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.build.output_dir = config_dir.join(&self.build.output_dir);
    }
}
