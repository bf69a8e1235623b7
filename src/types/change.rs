// src/types/change.rs
//! Change events emitted by the detector and the insight text attached to them

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    FounderTransition,
    StealthJoin,
    NoChange,
    Unknown,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::FounderTransition => "FOUNDER_TRANSITION",
            ChangeKind::StealthJoin => "STEALTH_JOIN",
            ChangeKind::NoChange => "NO_CHANGE",
            ChangeKind::Unknown => "UNKNOWN",
        }
    }

    /// Kinds that trigger insight generation and notification.
    pub fn is_alertable(&self) -> bool {
        matches!(self, ChangeKind::FounderTransition | ChangeKind::StealthJoin)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::FounderTransition => "Founder transition",
            ChangeKind::StealthJoin => "Stealth join",
            ChangeKind::NoChange => "No change",
            ChangeKind::Unknown => "First sighting",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "FOUNDER_TRANSITION" | "FOUNDER" => Ok(ChangeKind::FounderTransition),
            "STEALTH_JOIN" | "STEALTH" => Ok(ChangeKind::StealthJoin),
            "NO_CHANGE" => Ok(ChangeKind::NoChange),
            "UNKNOWN" => Ok(ChangeKind::Unknown),
            other => anyhow::bail!("Unknown change kind: {}", other),
        }
    }
}

/// Result of comparing a stored baseline with fresh enrichment data.
///
/// Immutable once created: fields are only ever read by the insight
/// generator, the notifier and the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub profile_id: String,
    pub previous_title: Option<String>,
    pub new_title: Option<String>,
    pub previous_company: Option<String>,
    pub new_company: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub change_kind: ChangeKind,
}

impl ChangeEvent {
    pub fn describe(&self) -> String {
        let prev_title = self.previous_title.as_deref().unwrap_or("an undisclosed role");
        let prev_company = self.previous_company.as_deref().unwrap_or("an undisclosed company");
        let new_title = self.new_title.as_deref().unwrap_or("an undisclosed role");
        let new_company = self.new_company.as_deref().unwrap_or("an undisclosed company");

        match self.change_kind {
            ChangeKind::FounderTransition => format!(
                "Moved from {} at {} to {} at {}",
                prev_title, prev_company, new_title, new_company
            ),
            ChangeKind::StealthJoin => format!(
                "Left {} at {} for a stealth company ({})",
                prev_title, prev_company, new_company
            ),
            ChangeKind::NoChange => format!("Still {} at {}", new_title, new_company),
            ChangeKind::Unknown => format!("First seen as {} at {}", new_title, new_company),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Ai,
    Fallback,
}

impl InsightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightSource::Ai => "ai",
            InsightSource::Fallback => "fallback",
        }
    }
}

impl FromStr for InsightSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(InsightSource::Ai),
            "fallback" => Ok(InsightSource::Fallback),
            other => anyhow::bail!("Unknown insight source: {}", other),
        }
    }
}

/// Outreach text generated once per change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightText {
    pub change_event_id: Uuid,
    pub summary: String,
    pub suggested_action: String,
    pub source: InsightSource,
}

/// An archived change event as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub event: ChangeEvent,
    pub full_name: Option<String>,
    pub insight: Option<InsightText>,
    pub notified: bool,
}
