//! CLI definitions for the bootstrapper.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bootstrap package wizard for VM-Series firewalls.
#[derive(Parser)]
#[command(name = "bootstrapper")]
#[command(about = "Bootstrap package wizard for VM-Series firewalls")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "BOOTSTRAPPER_CONFIG",
        default_value = "config/default.toml",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the API server in foreground (default)
    Run {
        /// Server host (overrides `server.host`)
        #[arg(long, env = "BOOTSTRAPPER_HOST")]
        host: Option<String>,

        /// Server port (overrides `server.port`)
        #[arg(long, env = "BOOTSTRAPPER_PORT")]
        port: Option<u16>,
    },

    /// Template repository commands
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Template catalog commands
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum RepoAction {
    /// List imported repositories
    List,

    /// Clone a repository into the templates root
    Import {
        /// Repository URL
        url: String,

        /// Local directory name (defaults to the last URL component)
        #[arg(long)]
        name: Option<String>,

        /// Branch to check out
        #[arg(long, default_value = "master")]
        branch: String,
    },

    /// Pull the latest changes for a repository
    Update {
        /// Repository name
        name: String,
    },

    /// Delete a repository from the templates root
    Remove {
        /// Repository name
        name: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum TemplatesAction {
    /// List templates
    List {
        /// Only templates carrying this label, as `key=value`
        #[arg(long)]
        label: Option<String>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}
