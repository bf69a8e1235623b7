// src/web/types.rs
use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::core::Database;
use crate::pipeline::RunOrchestrator;
use crate::types::{OutreachRecord, OutreachStatus};

/// Shared state behind every route
pub struct AppState {
    pub db: Database,
    pub orchestrator: RunOrchestrator,
    pub settings: SettingsView,
    /// One batch run at a time per process
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(db: Database, orchestrator: RunOrchestrator, config: &AppConfig) -> Self {
        let settings = SettingsView::from_config(config, orchestrator.channel_names());
        Self {
            db,
            orchestrator,
            settings,
            run_lock: Mutex::new(()),
        }
    }
}

#[derive(FromForm)]
pub struct RunUploadForm<'f> {
    pub csv_file: TempFile<'f>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ProfileStatusRequest {
    pub id: String,
    /// ACTIVE or PAUSED
    pub status: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct OutreachRequest {
    pub change_id: String,
    /// EMAIL when omitted
    pub method: Option<String>,
    pub notes: Option<String>,
    pub follow_up_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct OutreachReplyRequest {
    pub id: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct OutreachFollowUpRequest {
    pub id: String,
    pub days: i64,
    pub notes: Option<String>,
}

/// Outreach with its follow-up state evaluated at response time
#[derive(Debug, Clone, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct OutreachView {
    #[serde(flatten)]
    pub record: OutreachRecord,
    pub status: OutreachStatus,
    pub needs_follow_up: bool,
}

impl OutreachView {
    pub fn at(record: OutreachRecord, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            status: record.status(now),
            needs_follow_up: record.needs_follow_up(now),
            record,
        }
    }
}

/// Effective detection settings, without secrets
#[derive(Debug, Clone, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SettingsView {
    pub founder_keywords: Vec<String>,
    pub stealth_keywords: Vec<String>,
    pub placeholder_companies: Vec<String>,
    pub calls_per_minute: u32,
    pub insight_enabled: bool,
    pub insight_model: String,
    pub channels: Vec<String>,
}

impl SettingsView {
    pub fn from_config(config: &AppConfig, channels: Vec<String>) -> Self {
        Self {
            founder_keywords: config.detection.founder_keywords.clone(),
            stealth_keywords: config.detection.stealth_keywords.clone(),
            placeholder_companies: config.detection.placeholder_companies.clone(),
            calls_per_minute: config.enrichment.calls_per_minute,
            insight_enabled: config.insight.enabled,
            insight_model: config.insight.model.clone(),
            channels,
        }
    }
}

// Standard response envelope

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

impl TextResponse {
    pub fn success(message: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
            conversation_id,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            next_actions: None,
            conversation_id,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}
