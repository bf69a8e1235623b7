// src/insight/openai.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use super::{suggested_action, InsightGenerator};
use crate::config::InsightConfig;
use crate::types::response::{ChatMessage, ChatRequest, ChatResponse};
use crate::types::{ChangeEvent, InsightSource, InsightText, ProfileData};

const SYSTEM_PROMPT: &str = "You are an expert venture capital analyst who identifies promising pre-seed founders to contact. Create a concise, single-sentence explanation of why a founder is worth contacting based on their profile and recent career change.";

pub struct OpenAiInsightClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiInsightClient {
    pub fn new(config: &InsightConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn build_prompt(event: &ChangeEvent, profile: &ProfileData) -> String {
        let or_blank = |v: Option<&str>| v.unwrap_or_default().to_string();
        let name = profile.full_name.as_deref().unwrap_or(profile.id.as_str());
        let previous_role = format!(
            "{} at {}",
            or_blank(event.previous_title.as_deref()),
            or_blank(event.previous_company.as_deref())
        );
        let current_role = format!(
            "{} at {}",
            or_blank(event.new_title.as_deref()),
            or_blank(event.new_company.as_deref())
        );

        format!(
            r#"
Name: {}
Current Role: {}
Previous Role: {}
Education: {}
Skills: {}

Change: {}
Based on their background and new role, what makes them a good outreach target for pre-seed investment?
Provide one concise, actionable sentence that highlights why this founder would be valuable to connect with.
"#,
            name,
            current_role,
            previous_role,
            profile.education.join(", "),
            profile.skills.join(", "),
            event.describe()
        )
    }

    pub async fn send_completion(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!("Sending insight request to OpenAI ({})", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI error {}: {}", status, error_text);
            anyhow::bail!("OpenAI returned error {}: {}", status, error_text);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .context("OpenAI returned no completion")?;

        Ok(text)
    }
}

#[async_trait]
impl InsightGenerator for OpenAiInsightClient {
    async fn generate(&self, event: &ChangeEvent, profile: &ProfileData) -> Result<InsightText> {
        let prompt = Self::build_prompt(event, profile);
        let summary = self.send_completion(&prompt).await?;

        Ok(InsightText {
            change_event_id: event.id,
            summary,
            suggested_action: suggested_action(event, profile),
            source: InsightSource::Ai,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeKind;
    use chrono::Utc;
    use uuid::Uuid;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn founder_event() -> ChangeEvent {
        ChangeEvent {
            id: Uuid::new_v4(),
            profile_id: "42".to_string(),
            previous_title: Some("Engineer".to_string()),
            new_title: Some("Founder".to_string()),
            previous_company: Some("BigTech".to_string()),
            new_company: Some("Acme".to_string()),
            detected_at: Utc::now(),
            change_kind: ChangeKind::FounderTransition,
        }
    }

    fn client(server: &MockServer) -> OpenAiInsightClient {
        let config = InsightConfig {
            base_url: server.uri(),
            ..InsightConfig::default()
        };
        OpenAiInsightClient::new(&config, "sk-test").unwrap()
    }

    #[test]
    fn test_prompt_lists_roles_and_skills() {
        let mut profile = ProfileData::new("42").with_name("Jane Doe");
        profile.skills = vec!["Rust".to_string(), "ML".to_string()];

        let prompt = OpenAiInsightClient::build_prompt(&founder_event(), &profile);
        assert!(prompt.contains("Name: Jane Doe"));
        assert!(prompt.contains("Current Role: Founder at Acme"));
        assert!(prompt.contains("Previous Role: Engineer at BigTech"));
        assert!(prompt.contains("Skills: Rust, ML"));
    }

    #[tokio::test]
    async fn test_generate_uses_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_string_contains("gpt-4o-mini"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Strong technical founder.  "}}]
            })))
            .mount(&server)
            .await;

        let event = founder_event();
        let insight = client(&server)
            .generate(&event, &ProfileData::new("42").with_name("Jane Doe"))
            .await
            .unwrap();

        assert_eq!(insight.summary, "Strong technical founder.");
        assert_eq!(insight.source, InsightSource::Ai);
        assert_eq!(insight.change_event_id, event.id);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(&founder_event(), &ProfileData::new("42"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
