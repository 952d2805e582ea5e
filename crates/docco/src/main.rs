//! docco CLI - multilingual document builder.
//!
//! Provides commands for:
//! - `build`: Build a document into one output per language
//! - `translations update`: Regenerate the template and merge catalogs
//! - `translations status`: Show catalog completeness
//! - `translations init`: Create a catalog for a new language

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, TranslationsCommand};
use output::Output;

/// docco - Multilingual document builder.
#[derive(Parser)]
#[command(name = "docco", version, about)]
struct Cli {
    /// Show progress logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (default: auto-discover docco.toml).
    #[arg(short, long, global = true, env = "DOCCO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a document.
    Build(BuildArgs),
    /// Translation catalog commands.
    #[command(subcommand)]
    Translations(TranslationsCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Build(args) => args.execute(config),
        Commands::Translations(cmd) => cmd.execute(config),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
