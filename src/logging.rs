// src/logging.rs
//! Tracing setup: a plain bootstrap subscriber while the configuration is
//! read, then the configured one (JSON file or stdout)

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, LoggingConfig};

const DEFAULT_LOG_FILTER: &str = "founder_tracker=info,rocket::server=off";
const BOOTSTRAP_FILTER: &str = "founder_tracker=info";

fn bootstrap_subscriber<W>(make_writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt()
        .with_env_filter(EnvFilter::new(BOOTSTRAP_FILTER))
        .with_writer(make_writer)
        .with_ansi(false)
        .finish()
}

/// Load the configuration with its own messages written to `make_writer`
pub fn load_config_with<W>(path: Option<&Path>, make_writer: W) -> Result<AppConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing::subscriber::with_default(bootstrap_subscriber(make_writer), || {
        AppConfig::load(path)
    })
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    load_config_with(path, std::io::stderr)
}

/// Install the global subscriber described by the logging section
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file)
                        .with_current_span(false)
                        .with_span_list(false),
                )
                .with(filter)
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
    }
    Ok(())
}
