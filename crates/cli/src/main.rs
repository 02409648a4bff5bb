//! hassist CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a default config and a sample platform snapshot
//! - `chat`: Interactive chat or single-message mode
//! - `serve`: Start the HTTP front door
//! - `entities`: Print the exposed entities as CSV
//! - `services`: Print the services of a domain

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hassist",
    about = "hassist - conversational control for your smart home",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.hassist/config.toml)
    #[arg(short, long, global = true, env = "HASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and a sample snapshot
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Talk to the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List exposed entities
    Entities {
        /// Only entities in this area
        #[arg(short, long)]
        area: Option<String>,

        /// Only entities of this domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// List the services of a domain
    Services {
        domain: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Chat { message } => commands::chat::run(config_path, message).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Entities { area, domain } => {
            commands::entities::run(config_path, area, domain).await?
        }
        Commands::Services { domain } => commands::services::run(config_path, &domain).await?,
    }

    Ok(())
}
