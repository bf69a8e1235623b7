// src/discovery/serpapi.rs
//! LinkedIn profile discovery through SerpApi Google search

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::config::DiscoveryConfig;
use crate::types::response::{SerpOrganicResult, SerpSearchResponse};
use crate::utils::{linkedin_slug, non_blank, normalize_identifier};

const SEARCH_ENDPOINT: &str = "/search";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredProfile {
    pub name: String,
    pub link: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
}

pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(config: &DiscoveryConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn search(
        &self,
        keywords: &str,
        location: Option<&str>,
        page: u32,
    ) -> Result<Vec<DiscoveredProfile>> {
        let query = format!("site:linkedin.com/in/ {}", keywords.trim());
        let page = page.max(1).to_string();
        let mut params = vec![
            ("engine", "google"),
            ("q", query.as_str()),
            ("page", page.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(location) = location {
            params.push(("location", location));
        }

        info!("Searching SerpApi: {}", query);
        let response = self
            .client
            .get(format!("{}{}", self.base_url, SEARCH_ENDPOINT))
            .query(&params)
            .send()
            .await
            .context("SerpApi request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("SerpApi error {}: {}", status, error_text);
            anyhow::bail!("SerpApi returned error {}: {}", status, error_text);
        }

        let results: SerpSearchResponse = response
            .json()
            .await
            .context("Failed to parse SerpApi response")?;
        if let Some(message) = results.error {
            anyhow::bail!("SerpApi search failed: {}", message);
        }

        let profiles = extract_profiles(&results.organic_results);
        info!("SerpApi returned {} profile(s)", profiles.len());
        Ok(profiles)
    }
}

/// "Founder at Acme" / "Founder @ Acme" into its title and company
pub fn split_title_company(job: &str) -> (Option<String>, Option<String>) {
    for separator in [" at ", " @ "] {
        if let Some((title, company)) = job.split_once(separator) {
            return (non_blank(Some(title)), non_blank(Some(company)));
        }
    }
    (non_blank(Some(job)), None)
}

fn parse_result(result: &SerpOrganicResult) -> Option<DiscoveredProfile> {
    let link = normalize_identifier(result.link.as_deref()?)?;
    linkedin_slug(&link)?;

    let title = result.title.as_deref().unwrap_or_default();
    let title = title
        .rsplit_once(" | LinkedIn")
        .map(|(head, _)| head)
        .unwrap_or(title);

    let mut parts = title.split(" - ");
    let name = non_blank(parts.next())?;
    let rest: Vec<&str> = parts.map(str::trim).filter(|p| !p.is_empty()).collect();

    let (job_title, company) = match rest.as_slice() {
        [] => (None, None),
        [job] => split_title_company(job),
        [job, company, ..] => match split_title_company(job) {
            (title, Some(company)) => (title, Some(company)),
            (title, None) => (title, non_blank(Some(company))),
        },
    };

    Some(DiscoveredProfile {
        name,
        link,
        job_title,
        company,
        description: non_blank(result.snippet.as_deref()),
    })
}

/// Profiles from organic results, deduplicated by normalized link
pub fn extract_profiles(results: &[SerpOrganicResult]) -> Vec<DiscoveredProfile> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter_map(parse_result)
        .filter(|p| seen.insert(p.link.clone()))
        .collect()
}

/// Write an ingestible batch: linkedin_url,name,title,company
pub fn write_profiles_csv(path: &Path, profiles: &[DiscoveredProfile]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record(["linkedin_url", "name", "title", "company"])?;
    for profile in profiles {
        writer.write_record([
            profile.link.as_str(),
            profile.name.as_str(),
            profile.job_title.as_deref().unwrap_or_default(),
            profile.company.as_deref().unwrap_or_default(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    info!("Wrote {} profile(s) to {}", profiles.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::load_profiles;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn organic(title: &str, link: &str) -> SerpOrganicResult {
        SerpOrganicResult {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            snippet: None,
        }
    }

    #[test]
    fn test_title_variants() {
        let profiles = extract_profiles(&[
            organic("Jane Doe - Founder at Acme | LinkedIn", "https://www.linkedin.com/in/jane"),
            organic("John Roe - CTO - Stealth Startup", "https://uk.linkedin.com/in/john?trk=x"),
            organic("Company page", "https://www.linkedin.com/company/acme"),
            organic("Jane Doe - duplicate", "https://linkedin.com/in/jane/"),
        ]);

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].job_title.as_deref(), Some("Founder"));
        assert_eq!(profiles[0].company.as_deref(), Some("Acme"));
        assert_eq!(profiles[1].link, "https://www.linkedin.com/in/john");
        assert_eq!(profiles[1].company.as_deref(), Some("Stealth Startup"));
    }

    #[test]
    fn test_exported_csv_is_ingestible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovered.csv");
        let profiles = extract_profiles(&[organic(
            "Jane Doe - Founder @ Acme",
            "https://www.linkedin.com/in/jane",
        )]);

        write_profiles_csv(&path, &profiles).unwrap();

        let parsed = load_profiles(&path).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].id, "https://www.linkedin.com/in/jane");
        assert_eq!(parsed.rows[0].baseline_company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_search_sends_site_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_ENDPOINT))
            .and(query_param("q", "site:linkedin.com/in/ stealth founder"))
            .and(query_param("location", "Berlin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    {"title": "Jane Doe - Founder at Acme", "link": "https://www.linkedin.com/in/jane"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = DiscoveryConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
        };
        let client = SerpApiClient::new(&config, "serp-key").unwrap();
        let profiles = client
            .search("stealth founder", Some("Berlin"), 1)
            .await
            .unwrap();
        assert_eq!(profiles[0].name, "Jane Doe");
    }
}
