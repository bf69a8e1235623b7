// src/notify/gmail.rs
//! Email alerts through the Gmail API

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::json;
use tracing::debug;

use super::{render_body, render_subject, Alert, NotificationChannel};
use crate::google::{ensure_success, send_with_retry, GoogleTokenProvider, RetryPolicy};

const SEND_ENDPOINT: &str = "/gmail/v1/users/me/messages/send";

pub struct GmailChannel {
    client: reqwest::Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    sender: String,
    recipients: Vec<String>,
    retry: RetryPolicy,
}

impl GmailChannel {
    pub fn new(
        tokens: GoogleTokenProvider,
        base_url: &str,
        sender: &str,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            sender: sender.to_string(),
            recipients,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Single-line header value: control characters (CR/LF included) become spaces
fn header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// RFC 2047 encoded-word for non-ASCII header values
fn encode_header(value: &str) -> String {
    let value = header_value(value);
    if value.is_ascii() {
        value
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

/// Plain-text RFC 822 message
pub fn build_message(sender: &str, recipients: &[String], subject: &str, body: &str) -> String {
    let body = body.replace("\r\n", "\n").replace('\n', "\r\n");
    let recipients: Vec<String> = recipients.iter().map(|r| header_value(r)).collect();
    format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        header_value(sender),
        recipients.join(", "),
        encode_header(subject),
        body
    )
}

#[async_trait]
impl NotificationChannel for GmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, alert: &Alert<'_>) -> Result<()> {
        if self.recipients.is_empty() {
            anyhow::bail!("No email recipients configured");
        }

        let message = build_message(
            &self.sender,
            &self.recipients,
            &render_subject(alert),
            &render_body(alert),
        );
        let raw = URL_SAFE_NO_PAD.encode(message.as_bytes());

        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to authorize Gmail")?;

        debug!("Sending alert email to {} recipient(s)", self.recipients.len());
        let request = self
            .client
            .post(format!("{}{}", self.base_url, SEND_ENDPOINT))
            .bearer_auth(token)
            .json(&json!({ "raw": raw }));

        let response = send_with_retry(request, &self.retry)
            .await
            .context("Gmail send request failed")?;
        ensure_success(response, "Gmail").await?;
        Ok(())
    }
}
