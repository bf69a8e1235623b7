// src/core/database.rs
//! SQLite store: tracked profiles, archived change events and run reports

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{
    ChangeEvent, ChangeKind, ChangeRecord, InsightText, OutreachMethod, OutreachRecord,
    ProfileRecord, RunReport, RunSummary, TrackingStatus,
};

/// Fixed-width UTC text so that string comparison orders like time.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp in store: {}", raw))?
        .with_timezone(&Utc))
}

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            crate::utils::ensure_dir_exists(parent).await?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and dry runs
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn profiles(&self) -> ProfileRepository<'_> {
        ProfileRepository::new(&self.pool)
    }

    pub fn changes(&self) -> ChangeRepository<'_> {
        ChangeRepository::new(&self.pool)
    }

    pub fn runs(&self) -> RunRepository<'_> {
        RunRepository::new(&self.pool)
    }

    pub fn outreach(&self) -> OutreachRepository<'_> {
        OutreachRepository::new(&self.pool)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Archive the detected change (if any) and upsert the profile in one
    /// transaction. Either both land or neither does.
    ///
    /// Returns whether the profile upsert applied.
    pub async fn record_check(
        &self,
        run_id: Uuid,
        change: Option<(&ChangeEvent, Option<&InsightText>)>,
        record: &ProfileRecord,
    ) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;

        if let Some((event, insight)) = change {
            insert_change_event(&mut *tx, run_id, event, insight).await?;
        }
        let applied = upsert_profile(&mut *tx, record).await?;

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit check of profile {}", record.id))?;
        Ok(applied)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                full_name TEXT,
                last_known_title TEXT,
                last_known_company TEXT,
                last_checked_at TEXT NOT NULL,
                status_flag TEXT NOT NULL DEFAULT 'ACTIVE'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS change_events (
                id TEXT PRIMARY KEY,
                run_id TEXT NOT NULL,
                profile_id TEXT NOT NULL,
                previous_title TEXT,
                new_title TEXT,
                previous_company TEXT,
                new_company TEXT,
                detected_at TEXT NOT NULL,
                change_kind TEXT NOT NULL,
                insight_summary TEXT,
                suggested_action TEXT,
                insight_source TEXT,
                notified BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_change_events_profile ON change_events(profile_id);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_change_events_detected ON change_events(detected_at);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                rows_total INTEGER NOT NULL,
                processed INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                events INTEGER NOT NULL,
                alerts INTEGER NOT NULL,
                row_errors INTEGER NOT NULL,
                report_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outreach (
                id TEXT PRIMARY KEY,
                change_event_id TEXT NOT NULL REFERENCES change_events(id),
                profile_id TEXT NOT NULL,
                method TEXT NOT NULL,
                contacted_at TEXT NOT NULL,
                response_received BOOLEAN NOT NULL DEFAULT FALSE,
                notes TEXT NOT NULL DEFAULT '',
                follow_up_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_outreach_change ON outreach(change_event_id);")
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Statements shared by repositories and transactions =====

async fn upsert_profile<'e, E>(executor: E, record: &ProfileRecord) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO profiles (id, full_name, last_known_title, last_known_company, last_checked_at, status_flag)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            full_name = COALESCE(excluded.full_name, profiles.full_name),
            last_known_title = excluded.last_known_title,
            last_known_company = excluded.last_known_company,
            last_checked_at = excluded.last_checked_at
        WHERE excluded.last_checked_at > profiles.last_checked_at
        "#,
    )
    .bind(&record.id)
    .bind(&record.full_name)
    .bind(&record.last_known_title)
    .bind(&record.last_known_company)
    .bind(encode_timestamp(&record.last_checked_at))
    .bind(record.status_flag.as_str())
    .execute(executor)
    .await
    .with_context(|| format!("Failed to upsert profile {}", record.id))?;

    let applied = result.rows_affected() > 0;
    if !applied {
        debug!("Skipped stale update for profile {}", record.id);
    }
    Ok(applied)
}

async fn insert_change_event<'e, E>(
    executor: E,
    run_id: Uuid,
    event: &ChangeEvent,
    insight: Option<&InsightText>,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO change_events (
            id, run_id, profile_id, previous_title, new_title, previous_company, new_company,
            detected_at, change_kind, insight_summary, suggested_action, insight_source, notified
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE)
        "#,
    )
    .bind(event.id.to_string())
    .bind(run_id.to_string())
    .bind(&event.profile_id)
    .bind(&event.previous_title)
    .bind(&event.new_title)
    .bind(&event.previous_company)
    .bind(&event.new_company)
    .bind(encode_timestamp(&event.detected_at))
    .bind(event.change_kind.as_str())
    .bind(insight.map(|i| i.summary.as_str()))
    .bind(insight.map(|i| i.suggested_action.as_str()))
    .bind(insight.map(|i| i.source.as_str()))
    .execute(executor)
    .await
    .with_context(|| format!("Failed to archive change event {}", event.id))?;

    Ok(())
}

// ===== Row Models =====

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    full_name: Option<String>,
    last_known_title: Option<String>,
    last_known_company: Option<String>,
    last_checked_at: String,
    status_flag: String,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(ProfileRecord {
            id: row.id,
            full_name: row.full_name,
            last_known_title: row.last_known_title,
            last_known_company: row.last_known_company,
            last_checked_at: decode_timestamp(&row.last_checked_at)?,
            status_flag: row.status_flag.parse()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChangeRow {
    id: String,
    profile_id: String,
    previous_title: Option<String>,
    new_title: Option<String>,
    previous_company: Option<String>,
    new_company: Option<String>,
    detected_at: String,
    change_kind: String,
    insight_summary: Option<String>,
    suggested_action: Option<String>,
    insight_source: Option<String>,
    notified: bool,
    full_name: Option<String>,
}

impl TryFrom<ChangeRow> for ChangeRecord {
    type Error = anyhow::Error;

    fn try_from(row: ChangeRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .with_context(|| format!("Invalid change event id: {}", row.id))?;

        let insight = match (row.insight_summary, row.insight_source) {
            (Some(summary), Some(source)) => Some(InsightText {
                change_event_id: id,
                summary,
                suggested_action: row.suggested_action.unwrap_or_default(),
                source: source.parse()?,
            }),
            _ => None,
        };

        Ok(ChangeRecord {
            event: ChangeEvent {
                id,
                profile_id: row.profile_id,
                previous_title: row.previous_title,
                new_title: row.new_title,
                previous_company: row.previous_company,
                new_company: row.new_company,
                detected_at: decode_timestamp(&row.detected_at)?,
                change_kind: row.change_kind.parse()?,
            },
            full_name: row.full_name,
            insight,
            notified: row.notified,
        })
    }
}

// ===== Profile Repository =====

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, full_name, last_known_title, last_known_company, last_checked_at, status_flag
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .with_context(|| format!("Failed to load profile {}", id))?;

        row.map(ProfileRecord::try_from).transpose()
    }

    /// Insert or update a profile.
    ///
    /// Updates only apply when `last_checked_at` is newer than the stored
    /// value; returns `false` when a newer record already exists. The stored
    /// status flag is never changed here.
    pub async fn upsert(&self, record: &ProfileRecord) -> Result<bool> {
        upsert_profile(self.pool, record).await
    }

    pub async fn list(&self) -> Result<Vec<ProfileRecord>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, full_name, last_known_title, last_known_company, last_checked_at, status_flag
            FROM profiles
            ORDER BY last_checked_at DESC, id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list profiles")?;

        rows.into_iter().map(ProfileRecord::try_from).collect()
    }

    /// Pause or resume tracking; returns `false` for unknown ids
    pub async fn set_status(&self, id: &str, status: TrackingStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE profiles SET status_flag = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool)
            .await
            .with_context(|| format!("Failed to update status of profile {}", id))?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("Profile {} is now {}", id, status);
        }
        Ok(updated)
    }
}

// ===== Change Repository =====

const CHANGE_COLUMNS: &str = r#"
    c.id, c.profile_id, c.previous_title, c.new_title, c.previous_company, c.new_company,
    c.detected_at, c.change_kind, c.insight_summary, c.suggested_action, c.insight_source,
    c.notified, p.full_name
"#;

pub struct ChangeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChangeRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Archive an event that has not been delivered yet
    pub async fn archive(
        &self,
        run_id: Uuid,
        event: &ChangeEvent,
        insight: Option<&InsightText>,
    ) -> Result<()> {
        insert_change_event(self.pool, run_id, event, insight).await
    }

    pub async fn mark_notified(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE change_events SET notified = TRUE WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await
            .with_context(|| format!("Failed to flag change event {} as notified", id))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ChangeRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM change_events c
            LEFT JOIN profiles p ON p.id = c.profile_id
            WHERE c.id = ?
            "#,
            CHANGE_COLUMNS
        );

        let row = sqlx::query_as::<_, ChangeRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await
            .with_context(|| format!("Failed to load change event {}", id))?;

        row.map(ChangeRecord::try_from).transpose()
    }

    /// Most recent archived events, optionally filtered by kind
    pub async fn recent(&self, kind: Option<ChangeKind>, limit: u32) -> Result<Vec<ChangeRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM change_events c
            LEFT JOIN profiles p ON p.id = c.profile_id
            WHERE (?1 IS NULL OR c.change_kind = ?1)
            ORDER BY c.detected_at DESC
            LIMIT ?2
            "#,
            CHANGE_COLUMNS
        );

        let rows = sqlx::query_as::<_, ChangeRow>(&sql)
            .bind(kind.map(|k| k.as_str()))
            .bind(i64::from(limit))
            .fetch_all(self.pool)
            .await
            .context("Failed to list change events")?;

        rows.into_iter().map(ChangeRecord::try_from).collect()
    }

    pub async fn for_profile(&self, profile_id: &str) -> Result<Vec<ChangeRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM change_events c
            LEFT JOIN profiles p ON p.id = c.profile_id
            WHERE c.profile_id = ?
            ORDER BY c.detected_at ASC
            "#,
            CHANGE_COLUMNS
        );

        let rows = sqlx::query_as::<_, ChangeRow>(&sql)
            .bind(profile_id)
            .fetch_all(self.pool)
            .await
            .with_context(|| format!("Failed to list change events for {}", profile_id))?;

        rows.into_iter().map(ChangeRecord::try_from).collect()
    }
}

// ===== Run Repository =====

#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    run_id: String,
    source: String,
    started_at: String,
    finished_at: Option<String>,
    rows_total: i64,
    processed: i64,
    skipped: i64,
    events: i64,
    alerts: i64,
    row_errors: i64,
}

impl TryFrom<RunRow> for RunSummary {
    type Error = anyhow::Error;

    fn try_from(row: RunRow) -> Result<Self> {
        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.run_id)
                .with_context(|| format!("Invalid run id: {}", row.run_id))?,
            source: row.source,
            started_at: decode_timestamp(&row.started_at)?,
            finished_at: row
                .finished_at
                .as_deref()
                .map(decode_timestamp)
                .transpose()?,
            rows_total: row.rows_total,
            processed: row.processed,
            skipped: row.skipped,
            events: row.events,
            alerts: row.alerts,
            row_errors: row.row_errors,
        })
    }
}

pub struct RunRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RunRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, report: &RunReport) -> Result<()> {
        let summary = report.summary();
        let report_json =
            serde_json::to_string(report).context("Failed to serialize run report")?;

        sqlx::query(
            r#"
            INSERT INTO runs (
                run_id, source, started_at, finished_at, rows_total, processed, skipped,
                events, alerts, row_errors, report_json
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(summary.run_id.to_string())
        .bind(&summary.source)
        .bind(encode_timestamp(&summary.started_at))
        .bind(summary.finished_at.as_ref().map(encode_timestamp))
        .bind(summary.rows_total)
        .bind(summary.processed)
        .bind(summary.skipped)
        .bind(summary.events)
        .bind(summary.alerts)
        .bind(summary.row_errors)
        .bind(report_json)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to record run {}", report.run_id))?;

        Ok(())
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT run_id, source, started_at, finished_at, rows_total, processed, skipped,
                   events, alerts, row_errors
            FROM runs
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await
        .context("Failed to list runs")?;

        rows.into_iter().map(RunSummary::try_from).collect()
    }

    /// Full report of a past run
    pub async fn get(&self, run_id: Uuid) -> Result<Option<RunReport>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT report_json FROM runs WHERE run_id = ?")
                .bind(run_id.to_string())
                .fetch_optional(self.pool)
                .await
                .with_context(|| format!("Failed to load run {}", run_id))?;

        json.map(|j| serde_json::from_str(&j).context("Failed to parse stored run report"))
            .transpose()
    }
}

// ===== Outreach Repository =====

#[derive(Debug, sqlx::FromRow)]
struct OutreachRow {
    id: String,
    change_event_id: String,
    profile_id: String,
    method: String,
    contacted_at: String,
    response_received: bool,
    notes: String,
    follow_up_at: Option<String>,
}

impl TryFrom<OutreachRow> for OutreachRecord {
    type Error = anyhow::Error;

    fn try_from(row: OutreachRow) -> Result<Self> {
        Ok(OutreachRecord {
            id: Uuid::parse_str(&row.id)
                .with_context(|| format!("Invalid outreach id: {}", row.id))?,
            change_event_id: Uuid::parse_str(&row.change_event_id)
                .with_context(|| format!("Invalid change event id: {}", row.change_event_id))?,
            profile_id: row.profile_id,
            method: row.method.parse()?,
            contacted_at: decode_timestamp(&row.contacted_at)?,
            response_received: row.response_received,
            notes: row.notes,
            follow_up_at: row.follow_up_at.as_deref().map(decode_timestamp).transpose()?,
        })
    }
}

const OUTREACH_COLUMNS: &str = r#"
    id, change_event_id, profile_id, method, contacted_at, response_received, notes, follow_up_at
"#;

pub struct OutreachRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OutreachRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Log a contact attempt for an archived change.
    ///
    /// Returns `None` when the change event does not exist. Without notes the
    /// stored suggested action is used.
    pub async fn create(
        &self,
        change_event_id: Uuid,
        method: OutreachMethod,
        notes: Option<&str>,
        follow_up_at: Option<DateTime<Utc>>,
    ) -> Result<Option<OutreachRecord>> {
        let Some(change) = ChangeRepository::new(self.pool).get(change_event_id).await? else {
            return Ok(None);
        };

        let notes = notes
            .map(str::to_string)
            .or_else(|| change.insight.map(|i| i.suggested_action))
            .unwrap_or_default();

        let mut record = OutreachRecord::new(
            change_event_id,
            &change.event.profile_id,
            method,
            Utc::now(),
        )
        .with_notes(&notes);
        if let Some(at) = follow_up_at {
            record.set_follow_up(at, None);
        }

        sqlx::query(
            r#"
            INSERT INTO outreach (
                id, change_event_id, profile_id, method, contacted_at, response_received, notes, follow_up_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.change_event_id.to_string())
        .bind(&record.profile_id)
        .bind(record.method.as_str())
        .bind(encode_timestamp(&record.contacted_at))
        .bind(record.response_received)
        .bind(&record.notes)
        .bind(record.follow_up_at.as_ref().map(encode_timestamp))
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to record outreach for change {}", change_event_id))?;

        info!(
            "Outreach {} logged for profile {} via {}",
            record.id, record.profile_id, record.method
        );
        Ok(Some(record))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<OutreachRecord>> {
        let sql = format!("SELECT {} FROM outreach WHERE id = ?", OUTREACH_COLUMNS);
        let row = sqlx::query_as::<_, OutreachRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await
            .with_context(|| format!("Failed to load outreach {}", id))?;

        row.map(OutreachRecord::try_from).transpose()
    }

    pub async fn list(&self, profile_id: Option<&str>) -> Result<Vec<OutreachRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM outreach
            WHERE (?1 IS NULL OR profile_id = ?1)
            ORDER BY contacted_at DESC
            "#,
            OUTREACH_COLUMNS
        );
        let rows = sqlx::query_as::<_, OutreachRow>(&sql)
            .bind(profile_id)
            .fetch_all(self.pool)
            .await
            .context("Failed to list outreach")?;

        rows.into_iter().map(OutreachRecord::try_from).collect()
    }

    /// Unanswered outreach whose follow-up date is at or before `now`
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<OutreachRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM outreach
            WHERE response_received = FALSE
              AND follow_up_at IS NOT NULL
              AND follow_up_at <= ?
            ORDER BY follow_up_at ASC
            "#,
            OUTREACH_COLUMNS
        );
        let rows = sqlx::query_as::<_, OutreachRow>(&sql)
            .bind(encode_timestamp(&now))
            .fetch_all(self.pool)
            .await
            .context("Failed to list due follow-ups")?;

        rows.into_iter().map(OutreachRecord::try_from).collect()
    }

    pub async fn save(&self, record: &OutreachRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE outreach
            SET method = ?, response_received = ?, notes = ?, follow_up_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.method.as_str())
        .bind(record.response_received)
        .bind(&record.notes)
        .bind(record.follow_up_at.as_ref().map(encode_timestamp))
        .bind(record.id.to_string())
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to update outreach {}", record.id))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_received(
        &self,
        id: Uuid,
        notes: Option<&str>,
    ) -> Result<Option<OutreachRecord>> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.mark_as_received(notes);
        self.save(&record).await?;
        Ok(Some(record))
    }

    pub async fn schedule_follow_up(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Option<OutreachRecord>> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.set_follow_up(at, notes);
        self.save(&record).await?;
        Ok(Some(record))
    }
}
