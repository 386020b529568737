//! vaultpress CLI

use anyhow::{Context, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::Instrument;
use vaultpress::cli::{Cli, Command, ConfigCommand, ExportArgs};
use vaultpress::{ConflictPrompt, ExportConfig, ExportPipeline, LinePrompt, OpenAiTagSuggester};
use vaultpress::{expand_path, logging, report};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose)?;

    log::debug!("vaultpress v{}", env!("CARGO_PKG_VERSION"));

    // A broken file must not stop `config init --force` from replacing it
    if let Command::Config(ConfigCommand::Init { force }) = &cli.command {
        return init_config(&cli.config, *force).await;
    }

    let mut config = ExportConfig::load(&cli.config)
        .await
        .with_context(|| format!("Could not load {}", cli.config.display()))?;
    if let Some(key) = &cli.api_key {
        config.tag_service.api_key = key.clone();
    }

    match cli.command {
        Command::Export(args) => export(config, args).await,
        Command::Config(command) => run_config(config, &cli.config, command).await,
        Command::CheckTags => check_tags(config).await,
    }
}

async fn export(config: ExportConfig, args: ExportArgs) -> anyhow::Result<()> {
    let vault = tokio::fs::canonicalize(expand_path(&args.vault)?)
        .await
        .with_context(|| format!("Vault folder not found: {}", args.vault.display()))?;
    log::info!("Vault: {}", vault.display());

    let mut pipeline = ExportPipeline::new(config, &vault)?;
    let prompt: Box<dyn ConflictPrompt> = match args.on_conflict.fixed_choice() {
        Some(choice) => Box::new(choice),
        None => Box::new(LinePrompt::stdin()),
    };

    let mut failures = 0;
    for note in &args.notes {
        let path = note_path(note).await;
        let span = tracing::info_span!("note", path = %note.display());
        match pipeline
            .export_with(&path, prompt.as_ref())
            .instrument(span)
            .await
        {
            Ok(outcome) => println!("{}", report::render(&outcome, note, args.format)?),
            Err(e) => {
                log::error!("{}: {}", note.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} export(s) failed", failures, args.notes.len());
    }
    Ok(())
}

/// Absolute paths are canonicalized so they compare against the vault root
async fn note_path(note: &Path) -> PathBuf {
    if note.is_absolute() {
        tokio::fs::canonicalize(note)
            .await
            .unwrap_or_else(|_| note.to_path_buf())
    } else {
        note.to_path_buf()
    }
}

async fn run_config(
    mut config: ExportConfig,
    path: &Path,
    command: ConfigCommand,
) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Init { force } => return init_config(path, force).await,
        ConfigCommand::Show => {
            if !config.tag_service.api_key.is_empty() {
                config.tag_service.api_key = "********".to_string();
            }
            print!("{}", serde_yaml::to_string(&config)?);
            return Ok(());
        }
        ConfigCommand::AddTarget { path: folder } => {
            let added = config.add_target_folder(&folder)?;
            println!("Added {}", added.display());
        }
        ConfigCommand::RemoveTarget { path: folder } => {
            config.remove_target_folder(&folder)?;
            println!("Removed {}", folder.display());
        }
        ConfigCommand::UseTarget { path: folder } => {
            config.set_active_target(&folder)?;
            println!("Active target: {}", folder.display());
        }
    }

    config.save(path).await?;
    Ok(())
}

async fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    ExportConfig::default().save(path).await?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn check_tags(config: ExportConfig) -> anyhow::Result<()> {
    let suggester = OpenAiTagSuggester::new(config.tag_service)?;
    suggester.test_connection().await?;
    println!(
        "API connection successful ({}, model {})",
        suggester.config().base_url,
        suggester.config().model
    );
    if !suggester.config().enabled {
        println!("Automatic tagging is disabled in the configuration");
    }
    Ok(())
}
