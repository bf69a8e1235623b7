// src/pipeline/mod.rs
//! Wiring of the configured providers into a run orchestrator

pub mod orchestrator;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::detection::ChangeDetector;
use crate::enrichment::ProxycurlClient;
use crate::google::auth::{GMAIL_SEND_SCOPE, SHEETS_SCOPE};
use crate::google::{GoogleTokenProvider, ServiceAccountKey};
use crate::insight::OpenAiInsightClient;
use crate::notify::{GmailChannel, NotificationChannel, Notifier, SheetsChannel};

pub use orchestrator::RunOrchestrator;

/// Build the orchestrator from configuration, failing on missing credentials
pub async fn build_orchestrator(config: &AppConfig) -> Result<RunOrchestrator> {
    config.validate_credentials()?;
    let credentials = &config.credentials;

    let proxycurl_key = credentials
        .proxycurl_api_key
        .as_deref()
        .context("PROXYCURL_API_KEY is not set")?;
    let enrichment = ProxycurlClient::new(&config.enrichment, proxycurl_key)?;

    let mut orchestrator = RunOrchestrator::new(
        Arc::new(enrichment),
        ChangeDetector::new(&config.detection),
    );

    if config.insight.enabled {
        let openai_key = credentials
            .openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set")?;
        orchestrator =
            orchestrator.with_insight(Arc::new(OpenAiInsightClient::new(&config.insight, openai_key)?));
    }

    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
    if config.email_enabled() || config.sheets_enabled() {
        let key_path = credentials
            .google_service_account_file
            .as_deref()
            .context("GOOGLE_SERVICE_ACCOUNT_FILE is not set")?;
        let key = Arc::new(ServiceAccountKey::from_file(key_path).await?);

        if config.email_enabled() {
            let sender = config
                .notify
                .email_sender
                .as_deref()
                .context("notify.email_sender is not set")?;
            let tokens = GoogleTokenProvider::service_account(key.clone(), GMAIL_SEND_SCOPE, Some(sender));
            channels.push(Box::new(GmailChannel::new(
                tokens,
                &config.notify.gmail_base_url,
                sender,
                config.notify.email_recipients.clone(),
            )));
        }

        if let Some(sheet_id) = credentials.google_sheet_id.as_deref() {
            let tokens = GoogleTokenProvider::service_account(key.clone(), SHEETS_SCOPE, None);
            channels.push(Box::new(SheetsChannel::new(
                tokens,
                &config.notify.sheets_base_url,
                sheet_id,
                &config.notify.sheet_range,
            )));
        }
    }

    let notifier = Notifier::new(channels);
    if notifier.is_empty() {
        warn!("No notification channel configured, alerts are only archived");
    }
    info!(
        "Pipeline ready (insight: {}, channels: {:?})",
        config.insight.enabled,
        notifier.channel_names()
    );
    Ok(orchestrator.with_notifier(notifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[tokio::test]
    async fn test_missing_credentials_abort_before_building() {
        let config = AppConfig::default();
        let err = build_orchestrator(&config).await.err().unwrap();
        assert!(err.to_string().contains("PROXYCURL_API_KEY"));
    }

    #[tokio::test]
    async fn test_builds_without_channels() {
        let mut config = AppConfig::default();
        config.insight.enabled = false;
        config.credentials = Credentials::from_lookup(|key| {
            (key == "PROXYCURL_API_KEY").then(|| "pc-key".to_string())
        });

        let orchestrator = build_orchestrator(&config).await.unwrap();
        assert!(orchestrator.channel_names().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_service_account_file_fails() {
        let mut config = AppConfig::default();
        config.insight.enabled = false;
        config.credentials = Credentials::from_lookup(|key| match key {
            "PROXYCURL_API_KEY" => Some("pc-key".to_string()),
            "GOOGLE_SHEET_ID" => Some("sheet-1".to_string()),
            "GOOGLE_SERVICE_ACCOUNT_FILE" => Some("/nonexistent/sa.json".to_string()),
            _ => None,
        });

        let err = build_orchestrator(&config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("service account"));
    }
}
