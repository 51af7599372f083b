//! Avocado CLI - the main entry point.
//!
//! Commands:
//! - `ask`      - Answer one question (optionally threading a history file)
//! - `chat`     - Interactive multi-turn session
//! - `ingest`   - Load precomputed embeddings into an index
//! - `onboard`  - Write the default config
//! - `status`   - Show resolved configuration and index sizes

use std::path::PathBuf;

use avocado_config::{IndexBackend, Profile};
use avocado_index::ingest::DEFAULT_BATCH_SIZE;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "avocado",
    about = "Avocado — legal research assistant over Indian Supreme Court judgments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.avocado/config.toml)
    #[arg(long, global = true, env = "AVOCADO_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        question: String,

        /// Corpus profile
        #[arg(short, long, default_value = "large")]
        profile: Profile,

        /// JSON history file, read before and written after the turn
        #[arg(long)]
        history: Option<PathBuf>,

        /// Override the profile's index backend
        #[arg(long)]
        index: Option<IndexBackend>,
    },

    /// Start an interactive session
    Chat {
        #[arg(short, long, default_value = "large")]
        profile: Profile,

        #[arg(long)]
        index: Option<IndexBackend>,
    },

    /// Load JSONL embedding files into an index
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Profile whose index receives the records
        #[arg(short, long, default_value = "large")]
        profile: Profile,

        #[arg(long)]
        index: Option<IndexBackend>,

        /// Records per upsert
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Initialize configuration
    Onboard,

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay clean
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
        Commands::Ask {
            question,
            profile,
            history,
            index,
        } => commands::ask::run(config_path, &question, profile, index, history.as_deref()).await?,
        Commands::Chat { profile, index } => commands::chat::run(config_path, profile, index).await?,
        Commands::Ingest {
            files,
            profile,
            index,
            batch_size,
        } => commands::ingest::run(config_path, &files, profile, index, batch_size).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Status => commands::status::run(config_path).await?,
    }

    Ok(())
}
