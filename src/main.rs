use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kosh_rag::commands::{Overrides, ask_once, load_config, serve, show_status};
use kosh_rag::config::{get_config_dir, run_interactive_config, show_config};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "kosh_rag=info,tower_http=info";

#[derive(Parser)]
#[command(name = "kosh-rag")]
#[command(about = "Question answering over the AIKosh knowledge catalogue")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.kosh-rag)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and completion services
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP API
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Directory containing the corpus JSON files
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Answer a single question and exit
    Ask {
        question: String,
        /// Directory containing the corpus JSON files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show corpus, model and connectivity status
    Status {
        /// Directory containing the corpus JSON files
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = load_config(
                &config_dir,
                Overrides {
                    host,
                    port,
                    data_dir,
                },
            )?;
            serve(config).await?;
        }
        Commands::Ask {
            question,
            data_dir,
            json,
        } => {
            let config = load_config(
                &config_dir,
                Overrides {
                    data_dir,
                    ..Overrides::default()
                },
            )?;
            ask_once(config, question, json).await?;
        }
        Commands::Status { data_dir } => {
            let config = load_config(
                &config_dir,
                Overrides {
                    data_dir,
                    ..Overrides::default()
                },
            )?;
            show_status(&config)?;
        }
    }

    Ok(())
}
