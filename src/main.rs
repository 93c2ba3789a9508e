//! Bootstrapper
//!
//! Entry point for the bootstrap package wizard server and its CLI.

mod cli;
mod cmd_repo;
mod cmd_templates;
mod components;
mod server;

use clap::Parser;
use tracing::info;

use bootstrapper_config::ConfigLoader;

use cli::{Cli, Commands};
use cmd_repo::handle_repo_command;
use cmd_templates::handle_templates_command;
use server::{init_tracing, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;
    info!("Configuration: {}", cli.config.display());

    match cli.command {
        None => run_server(config, None, None).await,
        Some(Commands::Run { host, port }) => run_server(config, host, port).await,
        Some(Commands::Repo { action }) => handle_repo_command(action, &config).await,
        Some(Commands::Templates { action }) => handle_templates_command(action, &config).await,
    }
}
