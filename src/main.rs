//! Wavedit CLI
//!
//! Command-line interface for the waveform editing core.

use clap::Parser;
use env_logger::Env;
use log::info;

use wavedit::cli::commands::{self, parse_range};
use wavedit::cli::{Cli, Commands};
use wavedit::EditorConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Wavedit v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Wavedit v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &EditorConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Peaks { tone, width } => commands::peaks(&tone, width)?,
        Commands::Edit { tone, ops } => commands::edit(config, &tone, &ops)?,
        Commands::Play {
            tone,
            seek,
            elapsed,
            selection,
            selection_only,
            loop_playback,
        } => {
            let selection = selection.as_deref().map(parse_range).transpose()?;
            commands::play(
                config,
                &tone,
                seek,
                elapsed,
                selection,
                selection_only,
                loop_playback,
            )?
        }
    }
    Ok(())
}
