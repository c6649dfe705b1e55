mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrent_api_core::{
    fetch_and_export, load_config, validate_config, ExportTarget, Sources, WriteMode,
};

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    // Appending targets a stable file name
    let target = ExportTarget {
        output_dir: cli
            .output
            .clone()
            .unwrap_or_else(|| config.output.dir.clone()),
        timestamp: (!cli.append && !cli.no_timestamp).then(Utc::now),
        mode: if cli.append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        },
    };
    let command = cli.provider.into_fetch_command(config.filter.min_1080p);

    let sources = Sources::from_config(&config).context("Failed to create HTTP client")?;

    info!(source = %command.source(), "Fetching");
    let summary = fetch_and_export(&sources, &command, &target)
        .await
        .with_context(|| format!("{} run failed", command.source()))?;

    println!("Saved {} rows to {}", summary.rows, summary.path.display());
    Ok(())
}
