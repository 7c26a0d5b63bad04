//! Command-line interface for scribe
//!
//! `serve` runs the HTTP API; the remaining subcommands drive the knowledge
//! vault agent.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::Config;

mod utils;
mod vault;

/// Manuscript assistant and knowledge-vault agent
#[derive(Parser)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML or YAML); defaults to scribe.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Vault directory (overrides OBSIDIAN_VAULT_PATH and [vault].path)
    #[arg(long, global = true, value_name = "DIR")]
    vault: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5000
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Poll Google Drive once and ingest new files into the vault
    Ingest,

    /// Poll Google Drive continuously
    Watch,

    /// Write the vault relationship report
    Analyze,

    /// Export project-worthy notes to Notion and write the export report
    Export,

    /// Write the research opportunities report
    Research,

    /// Ingest, analyze, export (on the configured day) and research
    RunAll,

    /// Ingest a single local file into the vault
    IngestFile {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // INFO by default, DEBUG with --verbose; RUST_LOG directives are kept.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let bind = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        _ => None,
    };
    let overrides = CliOverrides { vault: cli.vault.clone(), db: cli.db.clone(), bind };

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "scribe", &mut std::io::stdout());
            Ok(())
        }
        Commands::Serve { .. } => crate::server::run(resolve_config(cli.config, &overrides)?),
        Commands::Ingest => vault::ingest(&resolve_config(cli.config, &overrides)?),
        Commands::Watch => vault::watch(&resolve_config(cli.config, &overrides)?),
        Commands::Analyze => vault::analyze(&resolve_config(cli.config, &overrides)?),
        Commands::Export => vault::export(&resolve_config(cli.config, &overrides)?),
        Commands::Research => vault::research(&resolve_config(cli.config, &overrides)?),
        Commands::RunAll => vault::run_all(&resolve_config(cli.config, &overrides)?),
        Commands::IngestFile { path } => vault::ingest_file(&resolve_config(cli.config, &overrides)?, &path),
    }
}

/// Defaults, config file, environment, then command-line flags.
fn resolve_config(config_path: Option<PathBuf>, overrides: &CliOverrides) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = load_config(&cwd, config_path.as_deref())?;
    Ok(merge_cli_with_config(config, overrides))
}
