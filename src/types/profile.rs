// src/types/profile.rs
//! Tracked profile state and fresh enrichment data

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::non_blank;

/// Whether the orchestrator should keep checking a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingStatus {
    Active,
    Paused,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Active => "ACTIVE",
            TrackingStatus::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(TrackingStatus::Active),
            "PAUSED" => Ok(TrackingStatus::Paused),
            other => anyhow::bail!("Unknown tracking status: {}", other),
        }
    }
}

/// Last-known state of a tracked person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub full_name: Option<String>,
    pub last_known_title: Option<String>,
    pub last_known_company: Option<String>,
    pub last_checked_at: DateTime<Utc>,
    pub status_flag: TrackingStatus,
}

impl ProfileRecord {
    pub fn new(id: &str, checked_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            full_name: None,
            last_known_title: None,
            last_known_company: None,
            last_checked_at: checked_at,
            status_flag: TrackingStatus::Active,
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.full_name = non_blank(name);
        self
    }

    pub fn with_role(mut self, title: Option<&str>, company: Option<&str>) -> Self {
        self.last_known_title = non_blank(title);
        self.last_known_company = non_blank(company);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.status_flag == TrackingStatus::Paused
    }

    pub fn role(&self) -> RoleSnapshot {
        RoleSnapshot::new(
            self.last_known_title.as_deref(),
            self.last_known_company.as_deref(),
        )
    }
}

/// A title/company pair, blank values collapsed to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub title: Option<String>,
    pub company: Option<String>,
}

impl RoleSnapshot {
    pub fn new(title: Option<&str>, company: Option<&str>) -> Self {
        Self {
            title: non_blank(title),
            company: non_blank(company),
        }
    }
}

/// Fresh profile data returned by an enrichment provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub previous_title: Option<String>,
    pub previous_company: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Pre-formatted lines such as "MSc in Physics from ETH".
    #[serde(default)]
    pub education: Vec<String>,
}

impl ProfileData {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, title: Option<&str>, company: Option<&str>) -> Self {
        self.title = non_blank(title);
        self.company = non_blank(company);
        self
    }

    pub fn with_name(mut self, full_name: &str) -> Self {
        self.full_name = non_blank(Some(full_name));
        self.first_name = full_name.split_whitespace().next().map(str::to_string);
        self
    }

    pub fn role(&self) -> RoleSnapshot {
        RoleSnapshot::new(self.title.as_deref(), self.company.as_deref())
    }

    /// First name for greetings, falling back to the first word of the full name.
    pub fn greeting_name(&self) -> Option<&str> {
        self.first_name
            .as_deref()
            .or_else(|| self.full_name.as_deref()?.split_whitespace().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_status_round_trip_through_text() {
        assert_eq!("paused".parse::<TrackingStatus>().unwrap(), TrackingStatus::Paused);
        assert_eq!(TrackingStatus::Active.to_string(), "ACTIVE");
        assert!("archived".parse::<TrackingStatus>().is_err());
    }

    #[test]
    fn test_blank_role_fields_collapse_to_none() {
        let record = ProfileRecord::new("42", Utc::now()).with_role(Some("  "), Some("Acme"));
        assert_eq!(record.last_known_title, None);
        assert_eq!(record.last_known_company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_greeting_name_falls_back_to_full_name() {
        let mut data = ProfileData::new("42");
        data.full_name = Some("Ada Lovelace".to_string());
        assert_eq!(data.greeting_name(), Some("Ada"));
    }
}
