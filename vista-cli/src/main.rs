use std::time::Duration;

use clap::Parser;
use error::AppError;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use vista_engine::ClientConfig;

mod cli;
mod commands;
mod error;
mod surface;

use cli::{CliArgs, Command};
use commands::CommandExecutor;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Values from .env must be visible before clap reads the environment
    let dotenv = dotenvy::dotenv();

    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("vista.log")?;

    // stdout carries command output, logs go to stderr
    let multi_writer = MakeWriterExt::and(std::io::stderr, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(AppError::Initialization(format!("Invalid .env file: {e}"))),
    }

    let config = ClientConfig::builder()
        .with_api_base_url(&args.api_base_url)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_start_timeout(Duration::from_secs(args.start_timeout))
        .with_attach_timeout(Duration::from_secs(args.attach_timeout))
        .build();
    info!(api_base_url = %config.api_base_url, "Using backend API");

    let executor = CommandExecutor::new(config)?;

    match args.command {
        Command::Stream {
            source_url,
            surface,
        } => executor.stream(source_url, surface).await,
        Command::Watch {
            debounce_ms,
            surface,
        } => {
            executor
                .watch(Duration::from_millis(debounce_ms), surface)
                .await
        }
        Command::Overlays { action } => executor.overlays(action).await,
        Command::Compose { surface } => executor.compose(surface).await,
    }
}
