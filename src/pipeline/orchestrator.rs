// src/pipeline/orchestrator.rs
//! One batch run: enrich, detect, explain, persist, notify

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::Database;
use crate::detection::ChangeDetector;
use crate::enrichment::EnrichmentClient;
use crate::ingest::{ParsedCsv, ProfileRow};
use crate::insight::{fallback_insight, InsightGenerator};
use crate::notify::{Alert, Notifier};
use crate::types::{
    ChangeEvent, ChangeKind, ChannelOutcome, InsightText, ProfileData, ProfileRecord, RowError,
    RunReport,
};

pub struct RunOrchestrator {
    enrichment: Arc<dyn EnrichmentClient>,
    insight: Option<Arc<dyn InsightGenerator>>,
    notifier: Notifier,
    detector: ChangeDetector,
}

/// What happened to a single row
enum RowOutcome {
    Skipped,
    Processed {
        event: ChangeEvent,
        deliveries: Vec<ChannelOutcome>,
    },
}

impl RunOrchestrator {
    pub fn new(enrichment: Arc<dyn EnrichmentClient>, detector: ChangeDetector) -> Self {
        Self {
            enrichment,
            insight: None,
            notifier: Notifier::default(),
            detector,
        }
    }

    pub fn with_insight(mut self, insight: Arc<dyn InsightGenerator>) -> Self {
        self.insight = Some(insight);
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.notifier.channel_names()
    }

    /// Process rows sequentially in CSV order.
    ///
    /// Row-level failures end up in the report; only a failure to start the
    /// run is returned as an error.
    pub async fn run(&self, db: &Database, source: &str, batch: ParsedCsv) -> Result<RunReport> {
        let mut report = RunReport::start(source, batch.total());
        report.row_errors.extend(batch.invalid);
        info!(
            "Run {} started: {} row(s) from {}",
            report.run_id, report.rows_total, source
        );

        let mut first_seen: HashMap<String, u64> = HashMap::new();
        for row in &batch.rows {
            if let Some(first_line) = first_seen.get(&row.id) {
                report.row_errors.push(RowError::new(
                    row.line,
                    Some(&row.id),
                    format!("Duplicate identifier, already processed on line {}", first_line),
                ));
                continue;
            }
            first_seen.insert(row.id.clone(), row.line);

            match self.process_row(db, report.run_id, row).await {
                Ok(RowOutcome::Skipped) => report.skipped += 1,
                Ok(RowOutcome::Processed { event, deliveries }) => {
                    report.processed += 1;
                    report.deliveries.extend(deliveries);
                    if event.change_kind != ChangeKind::NoChange {
                        report.events.push(event);
                    }
                }
                Err(e) => {
                    warn!("Row {} ({}) failed: {:#}", row.line, row.id, e);
                    report
                        .row_errors
                        .push(RowError::new(row.line, Some(&row.id), format!("{:#}", e)));
                }
            }
        }

        report.row_errors.sort_by_key(|e| e.row);
        report.finish();

        if let Err(e) = db.runs().record(&report).await {
            error!("Failed to persist report of run {}: {:#}", report.run_id, e);
        }

        info!(
            "Run {} finished: {} processed, {} skipped, {} event(s), {} alert(s), {} row error(s)",
            report.run_id,
            report.processed,
            report.skipped,
            report.events.len(),
            report.alerts(),
            report.row_errors.len()
        );
        Ok(report)
    }

    async fn process_row(&self, db: &Database, run_id: Uuid, row: &ProfileRow) -> Result<RowOutcome> {
        let stored = db.profiles().get(&row.id).await?;
        if stored.as_ref().is_some_and(ProfileRecord::is_paused) {
            info!("Skipping paused profile {}", row.id);
            return Ok(RowOutcome::Skipped);
        }

        let fresh = self.enrichment.fetch(&row.id).await?;

        // Stored state wins; the CSV columns only seed a first sighting
        let checked_at = Utc::now();
        let fresh_role = fresh.role();
        let event = match &stored {
            Some(record) => {
                self.detector
                    .detect_against_record(&row.id, Some(record), &fresh_role, checked_at)
            }
            None => self
                .detector
                .detect(&row.id, row.baseline().as_ref(), &fresh_role, checked_at),
        };

        let full_name = fresh
            .full_name
            .clone()
            .or_else(|| row.name.clone())
            .or_else(|| stored.as_ref().and_then(|s| s.full_name.clone()));

        let insight = if event.change_kind.is_alertable() {
            info!(
                "{} detected for {}: {}",
                event.change_kind,
                row.id,
                event.describe()
            );
            Some(self.explain(&event, &fresh).await)
        } else {
            None
        };

        // Nothing is sent until the event and the profile are stored, so a
        // failed write leaves the change to be re-detected next run
        let record = ProfileRecord::new(&row.id, checked_at)
            .with_name(full_name.as_deref())
            .with_role(fresh.title.as_deref(), fresh.company.as_deref());
        let change = (event.change_kind != ChangeKind::NoChange).then(|| (&event, insight.as_ref()));
        db.record_check(run_id, change, &record).await?;

        let mut deliveries = Vec::new();
        if let Some(text) = &insight {
            deliveries = self
                .notifier
                .dispatch(&Alert {
                    event: &event,
                    insight: text,
                    full_name: full_name.as_deref(),
                })
                .await;

            if deliveries.iter().any(|d| d.delivered) {
                if let Err(e) = db.changes().mark_notified(event.id).await {
                    warn!("Failed to flag change {} as notified: {:#}", event.id, e);
                }
            }
        }

        Ok(RowOutcome::Processed { event, deliveries })
    }

    /// AI insight when available, templated fallback otherwise
    async fn explain(&self, event: &ChangeEvent, profile: &ProfileData) -> InsightText {
        let Some(generator) = &self.insight else {
            return fallback_insight(event, profile);
        };

        match generator.generate(event, profile).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Insight generation failed for {}, using fallback: {:#}",
                    event.profile_id, e
                );
                fallback_insight(event, profile)
            }
        }
    }
}
