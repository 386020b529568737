//! Command line definitions

use crate::logging::LogFormat;
use crate::report::ReportFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vaultpress_export::ConflictChoice;

/// vaultpress - export Obsidian notes as Jekyll posts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "VAULTPRESS_CONFIG",
        default_value = "vaultpress.yaml"
    )]
    pub config: PathBuf,

    /// API key for the tag service (overrides the configuration file)
    #[arg(long, global = true, env = "VAULTPRESS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Debug logging (ignores RUST_LOG)
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export one or more notes into the active target folder
    Export(ExportArgs),
    /// Inspect or change the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Send a test message to the tag service
    CheckTags,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Notes to export, relative to the vault root
    #[arg(required = true)]
    pub notes: Vec<PathBuf>,

    /// Vault root
    #[arg(long, env = "VAULTPRESS_VAULT", default_value = ".")]
    pub vault: PathBuf,

    /// What to do when the note was exported before
    #[arg(long, value_enum, default_value_t = OnConflict::Ask)]
    pub on_conflict: OnConflict,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Replace an existing file
        #[arg(long, action = clap::ArgAction::SetTrue)]
        force: bool,
    },
    /// Print the configuration (API key masked)
    Show,
    /// Register a site folder; the first one becomes active
    AddTarget { path: PathBuf },
    /// Forget a site folder
    RemoveTarget { path: PathBuf },
    /// Make a registered site folder the active one
    UseTarget { path: PathBuf },
}

/// Conflict policy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Ask on the terminal
    Ask,
    /// Overwrite Date and Content
    Overwrite,
    /// Overwrite Content Only
    BodyOnly,
    /// Leave the existing post alone
    Cancel,
}

impl OnConflict {
    /// The choice to apply without asking, if any
    pub fn fixed_choice(self) -> Option<ConflictChoice> {
        match self {
            Self::Ask => None,
            Self::Overwrite => Some(ConflictChoice::OverwriteAll),
            Self::BodyOnly => Some(ConflictChoice::BodyOnly),
            Self::Cancel => Some(ConflictChoice::Cancel),
        }
    }
}
