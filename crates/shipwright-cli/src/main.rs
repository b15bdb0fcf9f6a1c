//! Shipwright CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(about = "Deployment orchestrator for the Chattis stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the stack and publish the frontend
    Deploy {
        /// Target environment (dev, test or prod)
        #[arg(default_value = "dev")]
        environment: String,
        /// Project name, the prefix for deterministic resource names
        #[arg(default_value = "chattis")]
        project: String,
    },
    /// Tear down the environment's stack
    Destroy {
        /// Target environment (dev, test or prod)
        #[arg(default_value = "dev")]
        environment: String,
        /// Project name, the prefix for deterministic resource names
        #[arg(default_value = "chattis")]
        project: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            environment,
            project,
        } => {
            commands::deploy(&environment, &project).await?;
        }
        Commands::Destroy {
            environment,
            project,
        } => {
            commands::destroy(&environment, &project).await?;
        }
    }

    Ok(())
}
