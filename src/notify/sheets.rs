// src/notify/sheets.rs
//! Append-only change log in a Google Sheet

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use tracing::debug;

use super::{sheet_row, Alert, NotificationChannel};
use crate::google::{ensure_success, send_with_retry, GoogleTokenProvider, RetryPolicy};

pub struct SheetsChannel {
    client: reqwest::Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    sheet_id: String,
    range: String,
    retry: RetryPolicy,
}

impl SheetsChannel {
    pub fn new(tokens: GoogleTokenProvider, base_url: &str, sheet_id: &str, range: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id: sheet_id.to_string(),
            range: range.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn append_url(&self) -> Result<Url> {
        let append_segment = format!("{}:append", self.range);
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Sheets base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets base URL cannot have a path"))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.sheet_id.as_str(),
                "values",
                append_segment.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

#[async_trait]
impl NotificationChannel for SheetsChannel {
    fn name(&self) -> &str {
        "sheets"
    }

    async fn deliver(&self, alert: &Alert<'_>) -> Result<()> {
        let url = self.append_url()?;
        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to authorize Google Sheets")?;

        debug!("Appending change row to sheet {}", self.sheet_id);
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [sheet_row(alert)] }));

        let response = send_with_retry(request, &self.retry)
            .await
            .context("Sheets append request failed")?;
        ensure_success(response, "Google Sheets").await?;
        Ok(())
    }
}
