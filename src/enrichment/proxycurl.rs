// src/enrichment/proxycurl.rs
//! Proxycurl person profile endpoint

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info};

use super::EnrichmentClient;
use crate::config::EnrichmentConfig;
use crate::core::RateLimiter;
use crate::types::{response::ProxycurlProfile, ProfileData};
use crate::utils::is_linkedin_url;

const PROFILE_ENDPOINT: &str = "/proxycurl/api/v2/linkedin";

pub struct ProxycurlClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl ProxycurlClient {
    pub fn new(config: &EnrichmentConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::per_minute(config.calls_per_minute),
        })
    }

    /// Opaque ids are treated as public LinkedIn slugs
    pub fn profile_url(id: &str) -> String {
        if is_linkedin_url(id) {
            id.to_string()
        } else {
            format!("https://www.linkedin.com/in/{}", id)
        }
    }
}

#[async_trait]
impl EnrichmentClient for ProxycurlClient {
    async fn fetch(&self, id: &str) -> Result<ProfileData> {
        let profile_url = Self::profile_url(id);
        let url = format!("{}{}", self.base_url, PROFILE_ENDPOINT);

        self.limiter.wait().await;
        info!("Fetching profile from Proxycurl: {}", profile_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("url", profile_url.as_str()), ("skills", "include")])
            .send()
            .await
            .with_context(|| format!("Proxycurl request failed for {}", id))?;

        let status = response.status();
        debug!("Proxycurl response status: {}", status);

        if status.is_success() {
            let profile: ProxycurlProfile = response
                .json()
                .await
                .context("Failed to parse Proxycurl profile")?;
            return Ok(profile.into_profile_data(id));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("Proxycurl error {} for {}: {}", status, id, error_text);

        match status {
            StatusCode::NOT_FOUND => anyhow::bail!("Profile not found: {}", profile_url),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                anyhow::bail!("Proxycurl rejected the API key ({})", status)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                anyhow::bail!("Proxycurl rate limit exceeded: {}", error_text)
            }
            _ => anyhow::bail!("Proxycurl returned error {}: {}", status, error_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ProxycurlClient {
        let config = EnrichmentConfig {
            base_url: server.uri(),
            calls_per_minute: 0,
            timeout_seconds: 5,
        };
        ProxycurlClient::new(&config, "pc-key").unwrap()
    }

    #[test]
    fn test_opaque_id_becomes_profile_url() {
        assert_eq!(
            ProxycurlClient::profile_url("jane-doe"),
            "https://www.linkedin.com/in/jane-doe"
        );
        assert_eq!(
            ProxycurlClient::profile_url("https://www.linkedin.com/in/jane-doe"),
            "https://www.linkedin.com/in/jane-doe"
        );
    }

    #[tokio::test]
    async fn test_fetch_picks_current_experience() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_ENDPOINT))
            .and(query_param("url", "https://www.linkedin.com/in/jane-doe"))
            .and(header("authorization", "Bearer pc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "full_name": "Jane Doe",
                "first_name": "Jane",
                "skills": ["Rust"],
                "experiences": [
                    {"title": "Engineer", "company": "BigTech",
                     "starts_at": {"year": 2019, "month": 1}, "ends_at": {"year": 2023, "month": 5}},
                    {"title": "Founder", "company": "Acme",
                     "starts_at": {"year": 2023, "month": 6}, "ends_at": null}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let data = client(&server)
            .fetch("https://www.linkedin.com/in/jane-doe")
            .await
            .unwrap();

        assert_eq!(data.title.as_deref(), Some("Founder"));
        assert_eq!(data.company.as_deref(), Some("Acme"));
        assert_eq!(data.previous_company.as_deref(), Some("BigTech"));
        assert_eq!(data.greeting_name(), Some("Jane"));
    }

    #[tokio::test]
    async fn test_not_found_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such profile"))
            .mount(&server)
            .await;

        let err = client(&server).fetch("ghost").await.unwrap_err();
        assert!(err.to_string().contains("Profile not found"));
    }
}
