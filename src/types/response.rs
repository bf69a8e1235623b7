// src/types/response.rs
//! Wire types for the external services the pipeline talks to

use serde::{Deserialize, Serialize};

use super::profile::ProfileData;

// ===== Proxycurl =====

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProxycurlDate {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxycurlExperience {
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_linkedin_profile_url: Option<String>,
    pub starts_at: Option<ProxycurlDate>,
    pub ends_at: Option<ProxycurlDate>,
}

impl ProxycurlExperience {
    fn is_current(&self) -> bool {
        self.ends_at.is_none()
    }

    fn start_key(&self) -> (i32, u32) {
        let start = self.starts_at.unwrap_or_default();
        (start.year.unwrap_or(0), start.month.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxycurlEducation {
    pub school: Option<String>,
    pub degree_name: Option<String>,
    pub field_of_study: Option<String>,
}

impl ProxycurlEducation {
    fn summary(&self) -> Option<String> {
        let school = self.school.as_deref().filter(|s| !s.trim().is_empty())?;
        let line = match (self.degree_name.as_deref(), self.field_of_study.as_deref()) {
            (Some(degree), Some(field)) => format!("{} in {} from {}", degree, field, school),
            (Some(degree), None) => format!("{} from {}", degree, school),
            (None, Some(field)) => format!("{} at {}", field, school),
            (None, None) => school.to_string(),
        };
        Some(line)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxycurlProfile {
    pub public_identifier: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experiences: Option<Vec<ProxycurlExperience>>,
    #[serde(default)]
    pub education: Option<Vec<ProxycurlEducation>>,
}

impl ProxycurlProfile {
    /// Current positions first, then most recent start date.
    pub fn sorted_experiences(&self) -> Vec<&ProxycurlExperience> {
        let mut experiences: Vec<&ProxycurlExperience> =
            self.experiences.iter().flatten().collect();
        experiences.sort_by(|a, b| {
            b.is_current()
                .cmp(&a.is_current())
                .then_with(|| b.start_key().cmp(&a.start_key()))
        });
        experiences
    }

    pub fn into_profile_data(self, id: &str) -> ProfileData {
        let (title, company, previous_title, previous_company) = {
            let sorted = self.sorted_experiences();
            let current = sorted.first();
            let previous = sorted.get(1);
            (
                current.and_then(|e| e.title.clone()),
                current.and_then(|e| e.company.clone()),
                previous.and_then(|e| e.title.clone()),
                previous.and_then(|e| e.company.clone()),
            )
        };

        let full_name = self.full_name.clone().or_else(|| {
            let joined = format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or_default(),
                self.last_name.as_deref().unwrap_or_default()
            );
            crate::utils::non_blank(Some(&joined))
        });

        let location = match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city.to_string()),
            (None, country) => country.map(str::to_string),
        };

        let mut data = ProfileData::new(id).with_role(title.as_deref(), company.as_deref());
        data.full_name = full_name;
        data.first_name = crate::utils::non_blank(self.first_name.as_deref());
        data.previous_title = crate::utils::non_blank(previous_title.as_deref());
        data.previous_company = crate::utils::non_blank(previous_company.as_deref());
        data.headline = crate::utils::non_blank(self.headline.as_deref());
        data.location = location;
        data.skills = self.skills.unwrap_or_default();
        data.education = self
            .education
            .unwrap_or_default()
            .iter()
            .filter_map(ProxycurlEducation::summary)
            .collect();
        data
    }
}

// ===== OpenAI chat completions =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

// ===== SerpApi =====

#[derive(Debug, Clone, Deserialize)]
pub struct SerpOrganicResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SerpSearchResponse {
    #[serde(default)]
    pub organic_results: Vec<SerpOrganicResult>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experience(title: &str, start: (i32, u32), ended: bool) -> ProxycurlExperience {
        ProxycurlExperience {
            title: Some(title.to_string()),
            company: Some(format!("{} Co", title)),
            company_linkedin_profile_url: None,
            starts_at: Some(ProxycurlDate {
                day: Some(1),
                month: Some(start.1),
                year: Some(start.0),
            }),
            ends_at: ended.then_some(ProxycurlDate {
                day: None,
                month: None,
                year: Some(2024),
            }),
        }
    }

    #[test]
    fn test_current_experience_wins_over_more_recent_ended_one() {
        let profile = ProxycurlProfile {
            experiences: Some(vec![
                experience("Advisor", (2024, 3), true),
                experience("Founder", (2021, 1), false),
                experience("Engineer", (2019, 6), true),
            ]),
            ..Default::default()
        };

        let data = profile.into_profile_data("42");
        assert_eq!(data.title.as_deref(), Some("Founder"));
        assert_eq!(data.previous_title.as_deref(), Some("Advisor"));
    }

    #[test]
    fn test_month_breaks_year_ties() {
        let profile = ProxycurlProfile {
            experiences: Some(vec![
                experience("Early", (2023, 2), true),
                experience("Late", (2023, 11), true),
            ]),
            ..Default::default()
        };

        let data = profile.into_profile_data("42");
        assert_eq!(data.title.as_deref(), Some("Late"));
        assert_eq!(data.previous_company.as_deref(), Some("Early Co"));
    }

    #[test]
    fn test_missing_experiences_yield_empty_role() {
        let json = r#"{"first_name":"Ada","last_name":"Lovelace","experiences":null}"#;
        let profile: ProxycurlProfile = serde_json::from_str(json).unwrap();
        let data = profile.into_profile_data("ada");
        assert_eq!(data.title, None);
        assert_eq!(data.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_education_is_summarized() {
        let profile = ProxycurlProfile {
            education: Some(vec![ProxycurlEducation {
                school: Some("ETH".to_string()),
                degree_name: Some("MSc".to_string()),
                field_of_study: Some("Physics".to_string()),
            }]),
            ..Default::default()
        };
        let data = profile.into_profile_data("x");
        assert_eq!(data.education, vec!["MSc in Physics from ETH".to_string()]);
    }
}
