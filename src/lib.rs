// Cadenza - Genre-driven MIDI composition generator
// Module declarations and the CLI entry point

use clap::Parser;

pub mod commands;
pub mod composer;
pub mod config;
pub mod genres;
pub mod pipeline;
pub mod preferences;
pub mod state;

use commands::{Cli, CommandError};

/// Parse arguments, initialize logging and run the requested command
pub fn run() -> Result<(), CommandError> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::debug!("Parsed arguments: {:?}", cli);
    commands::execute(&cli)
}
