//! SkillLoop CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write the default config and create the skills directory
//! - `agent`   — Interactive chat or single-message mode
//! - `skills`  — List the skills available for activation

use clap::{Parser, Subcommand};

mod archive;
mod commands;

#[derive(Parser)]
#[command(
    name = "skillloop",
    about = "SkillLoop — a tool-using CLI agent with switchable skills",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and the skills directory
    Onboard,

    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List skills available in the skill store
    Skills,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Agent { message } => commands::agent::run(message).await?,
        Commands::Skills => commands::skills::run().await?,
    }

    Ok(())
}
