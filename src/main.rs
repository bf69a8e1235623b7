use anyhow::Result;
use clap::Parser;
use founder_tracker::cli::{handle_command, TrackerCli};
use founder_tracker::logging::{init_tracing, load_config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TrackerCli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    info!(
        "Environment: {}",
        std::env::var("FOUNDER_TRACKER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    );
    info!("Database: {}", config.database_path.display());

    handle_command(cli, config).await
}
