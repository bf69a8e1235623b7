// src/types/run.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::change::{ChangeEvent, ChangeKind};

/// A CSV row that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line in the source CSV (header is line 1).
    pub row: u64,
    pub identifier: Option<String>,
    pub message: String,
}

impl RowError {
    pub fn new(row: u64, identifier: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            row,
            identifier: identifier.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Delivery result of one notification channel for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub change_event_id: Uuid,
    pub channel: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rows_total: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Events other than NO_CHANGE, in CSV order.
    pub events: Vec<ChangeEvent>,
    pub row_errors: Vec<RowError>,
    pub deliveries: Vec<ChannelOutcome>,
}

impl RunReport {
    pub fn start(source: &str, rows_total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            rows_total,
            processed: 0,
            skipped: 0,
            events: Vec::new(),
            row_errors: Vec::new(),
            deliveries: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.change_kind == kind).count()
    }

    pub fn alerts(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.change_kind.is_alertable())
            .count()
    }

    pub fn failed_deliveries(&self) -> usize {
        self.deliveries.iter().filter(|d| !d.delivered).count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            source: self.source.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            rows_total: self.rows_total as i64,
            processed: self.processed as i64,
            skipped: self.skipped as i64,
            events: self.events.len() as i64,
            alerts: self.alerts() as i64,
            row_errors: self.row_errors.len() as i64,
        }
    }
}

/// Compact view of a persisted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rows_total: i64,
    pub processed: i64,
    pub skipped: i64,
    pub events: i64,
    pub alerts: i64,
    pub row_errors: i64,
}
