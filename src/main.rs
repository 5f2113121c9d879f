//! Main entry point for RimWorld Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rimworld_translator::cli::commands::{self, Commands};
use rimworld_translator::TranslatorConfig;

/// RimWorld Translator - batch translation of mod localization files
#[derive(Parser, Debug)]
#[command(name = "rimworld-translator", version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Maximum concurrent file translations
    #[arg(long)]
    workers: Option<usize>,

    /// Attempts per text unit before keeping the original
    #[arg(long)]
    attempts: Option<u32>,

    /// Delay between attempts in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = TranslatorConfig::from_env()?;
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(attempts) = args.attempts {
        config.max_attempts = attempts;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay_ms = delay;
    }
    config.validate()?;

    // Execute command
    match args.command {
        Some(Commands::Translate { dir, source, target }) => {
            commands::handle_translate(dir, source, target, config).await?;
        }
        Some(Commands::Scan { dir }) => {
            commands::handle_scan(dir, config)?;
        }
        Some(Commands::Languages) => {
            commands::handle_languages();
        }
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
