// src/cli.rs
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::Database;
use crate::discovery::{write_profiles_csv, SerpApiClient};
use crate::ingest::load_profiles;
use crate::types::{ChangeKind, OutreachMethod, OutreachRecord, OutreachStatus, TrackingStatus};
use crate::utils::normalize_identifier;

#[derive(Parser)]
#[command(name = "founder-tracker")]
#[command(about = "Track LinkedIn profiles for founder transitions and stealth joins")]
pub struct TrackerCli {
    #[command(subcommand)]
    pub command: TrackerCommand,

    /// Path to config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum TrackerCommand {
    /// Process a CSV batch of profiles
    Run { csv_file: PathBuf },
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Search LinkedIn profiles through SerpApi and write them as an ingestible CSV
    Discover {
        keywords: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List tracked profiles
    Profiles,
    /// List archived changes
    Changes {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Stop checking a profile
    Pause { id: String },
    /// Resume checking a paused profile
    Resume { id: String },
    /// Log and follow up on outreach to alerted profiles
    Outreach {
        #[command(subcommand)]
        command: OutreachCommand,
    },
    /// Create directories and the database
    Init,
}

#[derive(Subcommand)]
pub enum OutreachCommand {
    /// Record a contact attempt for an archived change
    Log {
        change_id: String,
        #[arg(long, default_value = "email")]
        method: String,
        #[arg(long)]
        notes: Option<String>,
        /// Schedule a follow-up this many days from now
        #[arg(long)]
        follow_up_days: Option<u32>,
    },
    /// List outreach, newest first
    List {
        #[arg(long)]
        profile: Option<String>,
        /// Only unanswered outreach whose follow-up date has passed
        #[arg(long)]
        due: bool,
    },
    /// Mark an outreach as answered
    Responded {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Schedule a follow-up
    FollowUp {
        id: String,
        days: u32,
        #[arg(long)]
        notes: Option<String>,
    },
}

pub async fn handle_command(cli: TrackerCli, mut config: AppConfig) -> Result<()> {
    match cli.command {
        TrackerCommand::Run { csv_file } => {
            // Structure and credentials are checked before anything is fetched
            let batch = load_profiles(&csv_file)?;
            let orchestrator = crate::pipeline::build_orchestrator(&config).await?;
            config.ensure_directories().await?;
            let db = Database::new(&config.database_path).await?;

            let source = csv_file.display().to_string();
            let report = orchestrator.run(&db, &source, batch).await?;

            info!(
                "✅ Run {} finished: {}/{} processed, {} skipped",
                report.run_id, report.processed, report.rows_total, report.skipped
            );
            info!(
                "   {} founder transition(s), {} stealth join(s), {} first sighting(s)",
                report.count(ChangeKind::FounderTransition),
                report.count(ChangeKind::StealthJoin),
                report.count(ChangeKind::Unknown)
            );
            for event in report.events.iter().filter(|e| e.change_kind.is_alertable()) {
                info!("   🚀 {}: {}", event.profile_id, event.describe());
            }
            for row_error in &report.row_errors {
                warn!(
                    "   ❌ line {} ({}): {}",
                    row_error.row,
                    row_error.identifier.as_deref().unwrap_or("-"),
                    row_error.message
                );
            }
            if report.failed_deliveries() > 0 {
                warn!("   {} notification(s) failed", report.failed_deliveries());
            }
        }

        TrackerCommand::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            info!(
                "Server: http://{}:{}",
                config.server.address, config.server.port
            );
            crate::web::start_web_server(config).await?;
        }

        TrackerCommand::Discover {
            keywords,
            location,
            page,
            output,
        } => {
            let api_key = config
                .credentials
                .serpapi_api_key
                .as_deref()
                .context("SERPAPI_API_KEY is not set")?;
            let client = SerpApiClient::new(&config.discovery, api_key)?;
            let profiles = client.search(&keywords, location.as_deref(), page).await?;

            let output = output.unwrap_or_else(|| {
                config
                    .output_path
                    .join(format!("discovered_page{}.csv", page.max(1)))
            });
            if let Some(parent) = output.parent() {
                crate::utils::ensure_dir_exists(parent).await?;
            }
            write_profiles_csv(&output, &profiles)?;
            info!(
                "✅ {} profile(s) written to {}",
                profiles.len(),
                output.display()
            );
        }

        TrackerCommand::Profiles => {
            let db = Database::new(&config.database_path).await?;
            let profiles = db.profiles().list().await?;
            if profiles.is_empty() {
                info!("No tracked profiles yet");
            }
            for profile in profiles {
                info!(
                    "{} [{}] {} | {} at {} | checked {}",
                    profile.id,
                    profile.status_flag,
                    profile.full_name.as_deref().unwrap_or("-"),
                    profile.last_known_title.as_deref().unwrap_or("-"),
                    profile.last_known_company.as_deref().unwrap_or("-"),
                    profile.last_checked_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        TrackerCommand::Changes { kind, limit } => {
            let kind = kind.as_deref().map(str::parse::<ChangeKind>).transpose()?;
            let db = Database::new(&config.database_path).await?;
            let changes = db.changes().recent(kind, limit.max(1)).await?;
            if changes.is_empty() {
                info!("No archived changes");
            }
            for change in changes {
                info!(
                    "{} {} {}: {}",
                    change.event.detected_at.format("%Y-%m-%d %H:%M"),
                    change.event.change_kind,
                    change.full_name.as_deref().unwrap_or(&change.event.profile_id),
                    change.event.describe()
                );
                if let Some(insight) = change.insight {
                    info!("   💡 {}", insight.summary);
                    info!("   👉 {}", insight.suggested_action);
                }
            }
        }

        TrackerCommand::Pause { id } => {
            set_status(&config, &id, TrackingStatus::Paused).await?;
        }

        TrackerCommand::Resume { id } => {
            set_status(&config, &id, TrackingStatus::Active).await?;
        }

        TrackerCommand::Outreach { command } => {
            let db = Database::new(&config.database_path).await?;
            handle_outreach(&db, command).await?;
        }

        TrackerCommand::Init => {
            config.ensure_directories().await?;
            Database::new(&config.database_path).await?;
            info!("✅ Database ready: {}", config.database_path.display());
            if let Err(e) = config.validate_credentials() {
                warn!("{:#}", e);
            }
        }
    }

    Ok(())
}

async fn handle_outreach(db: &Database, command: OutreachCommand) -> Result<()> {
    match command {
        OutreachCommand::Log {
            change_id,
            method,
            notes,
            follow_up_days,
        } => {
            let change_id = parse_uuid(&change_id, "change")?;
            let method: OutreachMethod = method.parse()?;
            let follow_up_at = follow_up_days.map(|d| Utc::now() + Duration::days(i64::from(d)));

            let record = db
                .outreach()
                .create(change_id, method, notes.as_deref(), follow_up_at)
                .await?
                .with_context(|| format!("No archived change found for {}", change_id))?;
            info!("✅ Outreach {} logged for {}", record.id, record.profile_id);
        }

        OutreachCommand::List { profile, due } => {
            let now = Utc::now();
            let records = if due {
                db.outreach().due(now).await?
            } else {
                let profile = profile.as_deref().and_then(normalize_identifier);
                db.outreach().list(profile.as_deref()).await?
            };
            if records.is_empty() {
                info!("No outreach recorded");
            }
            for record in records {
                print_outreach(&record);
            }
        }

        OutreachCommand::Responded { id, notes } => {
            let id = parse_uuid(&id, "outreach")?;
            let record = db
                .outreach()
                .mark_received(id, notes.as_deref())
                .await?
                .with_context(|| format!("No outreach found for {}", id))?;
            info!("✅ Response recorded for {}", record.profile_id);
        }

        OutreachCommand::FollowUp { id, days, notes } => {
            let id = parse_uuid(&id, "outreach")?;
            let at = Utc::now() + Duration::days(i64::from(days));
            let record = db
                .outreach()
                .schedule_follow_up(id, at, notes.as_deref())
                .await?
                .with_context(|| format!("No outreach found for {}", id))?;
            info!(
                "✅ Follow-up with {} scheduled for {}",
                record.profile_id,
                at.format("%Y-%m-%d")
            );
        }
    }
    Ok(())
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("Invalid {} id: {}", what, raw))
}

fn print_outreach(record: &OutreachRecord) {
    let status = match record.status(Utc::now()) {
        OutreachStatus::Responded => "responded",
        OutreachStatus::FollowUpDue => "follow-up due",
        OutreachStatus::AwaitingResponse => "awaiting response",
    };
    info!(
        "{} {} {} via {} [{}]",
        record.id,
        record.contacted_at.format("%Y-%m-%d"),
        record.profile_id,
        record.method,
        status
    );
    if let Some(at) = record.follow_up_at {
        info!("   ⏰ follow up {}", at.format("%Y-%m-%d"));
    }
    if !record.notes.is_empty() {
        info!("   📝 {}", record.notes.replace('\n', " "));
    }
}

async fn set_status(config: &AppConfig, id: &str, status: TrackingStatus) -> Result<()> {
    let id = normalize_identifier(id).context("Profile identifier is empty")?;
    let db = Database::new(&config.database_path).await?;

    match db.profiles().set_status(&id, status).await {
        Ok(true) => info!("✅ {} is now {}", id, status),
        Ok(false) => error!("❌ No tracked profile found for {}", id),
        Err(e) => {
            error!("Failed to update {}: {:#}", id, e);
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = TrackerCli::parse_from(["founder-tracker", "run", "profiles.csv"]);
        assert!(matches!(cli.command, TrackerCommand::Run { csv_file } if csv_file == PathBuf::from("profiles.csv")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = TrackerCli::parse_from([
            "founder-tracker",
            "changes",
            "--kind",
            "founder",
            "--config",
            "custom.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            TrackerCommand::Changes { kind, limit } => {
                assert_eq!(kind.as_deref(), Some("founder"));
                assert_eq!(limit, 20);
            }
            _ => panic!("expected changes command"),
        }
    }

    #[test]
    fn test_discover_defaults_to_first_page() {
        let cli = TrackerCli::parse_from(["founder-tracker", "discover", "stealth founder"]);
        match cli.command {
            TrackerCommand::Discover { keywords, page, location, output } => {
                assert_eq!(keywords, "stealth founder");
                assert_eq!(page, 1);
                assert!(location.is_none());
                assert!(output.is_none());
            }
            _ => panic!("expected discover command"),
        }
    }

    #[tokio::test]
    async fn test_pause_and_resume_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("tracker.db"),
            ..AppConfig::default()
        };
        let db = Database::new(&config.database_path).await.unwrap();
        db.profiles()
            .upsert(&crate::types::ProfileRecord::new("42", chrono::Utc::now()))
            .await
            .unwrap();

        set_status(&config, "42", TrackingStatus::Paused).await.unwrap();
        let stored = db.profiles().get("42").await.unwrap().unwrap();
        assert!(stored.is_paused());

        set_status(&config, " 42 ", TrackingStatus::Active).await.unwrap();
        let stored = db.profiles().get("42").await.unwrap().unwrap();
        assert!(!stored.is_paused());
    }
    #[test]
    fn test_parse_outreach_log() {
        let cli = TrackerCli::parse_from([
            "founder-tracker",
            "outreach",
            "log",
            "8c1c5d1e-6f55-4f0e-9d7c-0a3c8d3b7f11",
            "--method",
            "linkedin",
            "--follow-up-days",
            "7",
        ]);
        match cli.command {
            TrackerCommand::Outreach {
                command:
                    OutreachCommand::Log {
                        change_id,
                        method,
                        notes,
                        follow_up_days,
                    },
            } => {
                assert_eq!(change_id, "8c1c5d1e-6f55-4f0e-9d7c-0a3c8d3b7f11");
                assert_eq!(method, "linkedin");
                assert!(notes.is_none());
                assert_eq!(follow_up_days, Some(7));
            }
            _ => panic!("expected outreach log command"),
        }
    }

    #[tokio::test]
    async fn test_outreach_commands_follow_up_flow() {
        let db = Database::in_memory().await.unwrap();
        let event = crate::types::ChangeEvent {
            id: Uuid::new_v4(),
            profile_id: "42".to_string(),
            previous_title: Some("Engineer".to_string()),
            new_title: Some("Founder".to_string()),
            previous_company: Some("BigTech".to_string()),
            new_company: Some("Acme".to_string()),
            detected_at: Utc::now(),
            change_kind: ChangeKind::FounderTransition,
        };
        db.changes().archive(Uuid::new_v4(), &event, None).await.unwrap();

        handle_outreach(
            &db,
            OutreachCommand::Log {
                change_id: event.id.to_string(),
                method: "phone".to_string(),
                notes: Some("Left a voicemail".to_string()),
                follow_up_days: Some(0),
            },
        )
        .await
        .unwrap();

        let due = db.outreach().due(Utc::now()).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].method, OutreachMethod::Phone);

        handle_outreach(
            &db,
            OutreachCommand::Responded {
                id: due[0].id.to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
        assert!(db.outreach().due(Utc::now()).await.unwrap().is_empty());

        let missing = handle_outreach(
            &db,
            OutreachCommand::Log {
                change_id: Uuid::new_v4().to_string(),
                method: "email".to_string(),
                notes: None,
                follow_up_days: None,
            },
        )
        .await;
        assert!(missing.is_err());

        let bad_id = handle_outreach(
            &db,
            OutreachCommand::FollowUp {
                id: "not-a-uuid".to_string(),
                days: 3,
                notes: None,
            },
        )
        .await;
        assert!(bad_id.is_err());
    }
}
