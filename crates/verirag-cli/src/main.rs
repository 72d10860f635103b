//! VeriRAG CLI - 命令行问答

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod session;

#[derive(Parser)]
#[command(name = "verirag")]
#[command(about = "VeriRAG - answers from your documents, verified, with a web fallback", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "verirag.json")]
    config: PathBuf,
    /// Override the corpus directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question session (default)
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question
        question: String,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show version info
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 日志写到 stderr, stdout 只留给对话
    let default_filter = if cli.verbose {
        "verirag=debug,info"
    } else {
        "verirag=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            commands::chat::run(&cli.config, cli.data_dir).await?;
        }
        Commands::Ask { question } => {
            commands::chat::ask(&cli.config, cli.data_dir, &question).await?;
        }
        Commands::Init { force } => {
            commands::init::run(&cli.config, force)?;
        }
        Commands::Version => {
            println!("verirag {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
