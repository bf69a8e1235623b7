// src/types/outreach.rs
//! Outreach attempts made after an alert

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutreachMethod {
    Email,
    Linkedin,
    Phone,
    Meeting,
    Other,
}

impl OutreachMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachMethod::Email => "EMAIL",
            OutreachMethod::Linkedin => "LINKEDIN",
            OutreachMethod::Phone => "PHONE",
            OutreachMethod::Meeting => "MEETING",
            OutreachMethod::Other => "OTHER",
        }
    }
}

impl fmt::Display for OutreachMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutreachMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "EMAIL" => Ok(OutreachMethod::Email),
            "LINKEDIN" => Ok(OutreachMethod::Linkedin),
            "PHONE" | "CALL" => Ok(OutreachMethod::Phone),
            "MEETING" => Ok(OutreachMethod::Meeting),
            "OTHER" => Ok(OutreachMethod::Other),
            other => anyhow::bail!("Unknown outreach method: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutreachStatus {
    AwaitingResponse,
    FollowUpDue,
    Responded,
}

/// One contact attempt, tied to the change event that prompted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub id: Uuid,
    pub change_event_id: Uuid,
    pub profile_id: String,
    pub method: OutreachMethod,
    pub contacted_at: DateTime<Utc>,
    pub response_received: bool,
    pub notes: String,
    pub follow_up_at: Option<DateTime<Utc>>,
}

impl OutreachRecord {
    pub fn new(
        change_event_id: Uuid,
        profile_id: &str,
        method: OutreachMethod,
        contacted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            change_event_id,
            profile_id: profile_id.to_string(),
            method,
            contacted_at,
            response_received: false,
            notes: String::new(),
            follow_up_at: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.trim().to_string();
        self
    }

    /// Unanswered and the follow-up date has passed
    pub fn needs_follow_up(&self, now: DateTime<Utc>) -> bool {
        !self.response_received && self.follow_up_at.is_some_and(|at| at <= now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> OutreachStatus {
        if self.response_received {
            OutreachStatus::Responded
        } else if self.needs_follow_up(now) {
            OutreachStatus::FollowUpDue
        } else {
            OutreachStatus::AwaitingResponse
        }
    }

    pub fn mark_as_received(&mut self, notes: Option<&str>) {
        self.response_received = true;
        if let Some(notes) = notes {
            self.append_note(notes);
        }
    }

    pub fn set_follow_up(&mut self, at: DateTime<Utc>, notes: Option<&str>) {
        self.follow_up_at = Some(at);
        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            self.append_note(&format!("Follow-up notes: {}", notes));
        }
    }

    fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        if self.notes.is_empty() {
            self.notes = note.to_string();
        } else {
            self.notes = format!("{}\n\n{}", self.notes, note);
        }
    }
}
