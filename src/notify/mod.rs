// src/notify/mod.rs
//! Delivery of alertable change events to email and the shared sheet

pub mod gmail;
pub mod sheets;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::database::encode_timestamp;
use crate::types::{ChangeEvent, ChannelOutcome, InsightText};

pub use gmail::GmailChannel;
pub use sheets::SheetsChannel;

/// Everything a channel needs to render one alert
#[derive(Debug, Clone, Copy)]
pub struct Alert<'a> {
    pub event: &'a ChangeEvent,
    pub insight: &'a InsightText,
    pub full_name: Option<&'a str>,
}

impl Alert<'_> {
    pub fn display_name(&self) -> &str {
        self.full_name.unwrap_or(self.event.profile_id.as_str())
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert<'_>) -> Result<()>;
}

/// Fans an alert out to every registered channel
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    /// Channels are independent: one failing never stops the others
    pub async fn dispatch(&self, alert: &Alert<'_>) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let outcome = match channel.deliver(alert).await {
                Ok(()) => {
                    info!(
                        "Delivered {} for {} via {}",
                        alert.event.change_kind,
                        alert.event.profile_id,
                        channel.name()
                    );
                    ChannelOutcome {
                        change_event_id: alert.event.id,
                        channel: channel.name().to_string(),
                        delivered: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(
                        "Channel {} failed for {}: {:#}",
                        channel.name(),
                        alert.event.profile_id,
                        e
                    );
                    ChannelOutcome {
                        change_event_id: alert.event.id,
                        channel: channel.name().to_string(),
                        delivered: false,
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

pub fn render_subject(alert: &Alert<'_>) -> String {
    let event = alert.event;
    let role = match (event.new_title.as_deref(), event.new_company.as_deref()) {
        (Some(title), Some(company)) => format!("{} at {}", title, company),
        (Some(title), None) => title.to_string(),
        (None, Some(company)) => company.to_string(),
        (None, None) => "a new role".to_string(),
    };
    format!(
        "[{}] {} is now {}",
        event.change_kind.label(),
        alert.display_name(),
        role
    )
}

pub fn render_body(alert: &Alert<'_>) -> String {
    let event = alert.event;
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();

    format!(
        "{name}\n\
         Profile: {profile}\n\
         Change: {change}\n\
         Previous: {prev_title} at {prev_company}\n\
         Now: {new_title} at {new_company}\n\
         Detected: {detected}\n\
         \n\
         Why reach out: {summary}\n\
         Suggested action: {action}\n",
        name = alert.display_name(),
        profile = event.profile_id,
        change = event.change_kind.label(),
        prev_title = or_dash(event.previous_title.as_deref()),
        prev_company = or_dash(event.previous_company.as_deref()),
        new_title = or_dash(event.new_title.as_deref()),
        new_company = or_dash(event.new_company.as_deref()),
        detected = encode_timestamp(&event.detected_at),
        summary = alert.insight.summary,
        action = alert.insight.suggested_action,
    )
}

/// name, change_kind, previous_title, new_title, detected_at, insight_summary
pub fn sheet_row(alert: &Alert<'_>) -> Vec<String> {
    let event = alert.event;
    vec![
        alert.display_name().to_string(),
        event.change_kind.as_str().to_string(),
        event.previous_title.clone().unwrap_or_default(),
        event.new_title.clone().unwrap_or_default(),
        encode_timestamp(&event.detected_at),
        alert.insight.summary.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeKind, InsightSource};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    fn event() -> ChangeEvent {
        ChangeEvent {
            id: Uuid::new_v4(),
            profile_id: "42".to_string(),
            previous_title: Some("Software Engineer".to_string()),
            new_title: Some("Founder".to_string()),
            previous_company: Some("BigTech".to_string()),
            new_company: Some("Acme".to_string()),
            detected_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            change_kind: ChangeKind::FounderTransition,
        }
    }

    fn insight(event: &ChangeEvent) -> InsightText {
        InsightText {
            change_event_id: event.id,
            summary: "Second-time builder".to_string(),
            suggested_action: "Congratulate Jane".to_string(),
            source: InsightSource::Ai,
        }
    }

    struct Recording {
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NotificationChannel for Recording {
        fn name(&self) -> &str {
            self.name
        }

        async fn deliver(&self, _alert: &Alert<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("smtp down");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_channel_does_not_block_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = Notifier::new(vec![
            Box::new(Recording { name: "email", fail: true, calls: calls.clone() }),
            Box::new(Recording { name: "sheets", fail: false, calls: calls.clone() }),
        ]);

        let e = event();
        let i = insight(&e);
        let outcomes = notifier
            .dispatch(&Alert { event: &e, insight: &i, full_name: Some("Jane Doe") })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!outcomes[0].delivered);
        assert_eq!(outcomes[0].error.as_deref(), Some("smtp down"));
        assert!(outcomes[1].delivered);
    }

    #[test]
    fn test_subject_and_row_rendering() {
        let e = event();
        let i = insight(&e);
        let alert = Alert { event: &e, insight: &i, full_name: Some("Jane Doe") };

        assert_eq!(
            render_subject(&alert),
            "[Founder transition] Jane Doe is now Founder at Acme"
        );
        assert_eq!(
            sheet_row(&alert),
            vec![
                "Jane Doe",
                "FOUNDER_TRANSITION",
                "Software Engineer",
                "Founder",
                "2024-05-01T09:30:00.000000Z",
                "Second-time builder"
            ]
        );
        assert!(render_body(&alert).contains("Suggested action: Congratulate Jane"));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let e = event();
        let i = insight(&e);
        let alert = Alert { event: &e, insight: &i, full_name: None };
        assert_eq!(alert.display_name(), "42");
    }
}
