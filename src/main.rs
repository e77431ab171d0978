//! Creator Compass CLI entry point.

use anyhow::Result;
use clap::Parser;
use creator_compass::cli::{commands, Cli, Commands};
use creator_compass::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("creator_compass={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Analyze { file, author, title } => {
            commands::run_analyze(file, author.clone(), title.clone(), settings).await?;
        }

        Commands::Creator { folder } => {
            commands::run_creator(folder, settings).await?;
        }

        Commands::Batch { dir, limit, delay } => {
            commands::run_batch(dir, *limit, *delay, settings).await?;
        }

        Commands::Cache { action } => {
            commands::run_cache(action, &settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
