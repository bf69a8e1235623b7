// src/insight/mod.rs
//! Outreach text for alertable change events

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChangeEvent, ChangeKind, InsightSource, InsightText, ProfileData};

pub use openai::OpenAiInsightClient;

#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, event: &ChangeEvent, profile: &ProfileData) -> Result<InsightText>;
}

fn display_name(profile: &ProfileData) -> &str {
    profile
        .full_name
        .as_deref()
        .unwrap_or(profile.id.as_str())
}

/// Next step for whoever reaches out
pub fn suggested_action(event: &ChangeEvent, profile: &ProfileData) -> String {
    let first_name = profile.greeting_name().unwrap_or("them");
    let new_title = event.new_title.as_deref().unwrap_or("founder");

    let mut action = match (event.change_kind, event.new_company.as_deref()) {
        (ChangeKind::StealthJoin, _) | (_, None) => {
            format!("Ask {} what they are building", first_name)
        }
        (_, Some(company)) => format!(
            "Congratulate {} on their new role as {} at {}",
            first_name, new_title, company
        ),
    };

    if let (Some(title), Some(company)) = (
        event.previous_title.as_deref(),
        event.previous_company.as_deref(),
    ) {
        action.push_str(&format!(
            " and mention their previous experience as {} at {}",
            title, company
        ));
    }

    action
}

/// Templated insight used when the AI service is disabled or fails
pub fn fallback_insight(event: &ChangeEvent, profile: &ProfileData) -> InsightText {
    let summary = match event.change_kind {
        ChangeKind::FounderTransition => format!(
            "{} just became {}: worth an early conversation before the round forms.",
            display_name(profile),
            event.new_title.as_deref().unwrap_or("a founder")
        ),
        ChangeKind::StealthJoin => format!(
            "{} left {} for a stealth company: likely early-stage and open to investors.",
            display_name(profile),
            event
                .previous_company
                .as_deref()
                .unwrap_or("their previous company")
        ),
        _ => format!("{}: {}.", display_name(profile), event.describe()),
    };

    InsightText {
        change_event_id: event.id,
        summary,
        suggested_action: suggested_action(event, profile),
        source: InsightSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn event(kind: ChangeKind, new_company: Option<&str>) -> ChangeEvent {
        ChangeEvent {
            id: Uuid::new_v4(),
            profile_id: "42".to_string(),
            previous_title: Some("Engineer".to_string()),
            new_title: Some("Founder".to_string()),
            previous_company: Some("BigTech".to_string()),
            new_company: new_company.map(str::to_string),
            detected_at: Utc::now(),
            change_kind: kind,
        }
    }

    #[test]
    fn test_suggested_action_congratulates_by_first_name() {
        let profile = ProfileData::new("42").with_name("Jane Doe");
        let action = suggested_action(&event(ChangeKind::FounderTransition, Some("Acme")), &profile);
        assert_eq!(
            action,
            "Congratulate Jane on their new role as Founder at Acme and mention their previous experience as Engineer at BigTech"
        );
    }

    #[test]
    fn test_fallback_for_stealth_join() {
        let profile = ProfileData::new("42");
        let e = event(ChangeKind::StealthJoin, None);
        let insight = fallback_insight(&e, &profile);

        assert_eq!(insight.source, InsightSource::Fallback);
        assert_eq!(insight.change_event_id, e.id);
        assert!(insight.summary.starts_with("42 left BigTech"));
        assert!(insight.suggested_action.starts_with("Ask them what they are building"));
    }
}
