// src/web/handlers/profile_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::types::{ChangeKind, ChangeRecord, ProfileRecord, TrackingStatus};
use crate::utils::normalize_identifier;
use crate::web::types::{
    ActionResponse, AppState, DataResponse, ProfileStatusRequest, StandardErrorResponse,
    StandardRequest, WithConversationId,
};

const DEFAULT_CHANGES: u32 = 50;
const MAX_CHANGES: u32 = 500;

fn database_error(what: &str, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("Failed to {}", what),
        "DATABASE_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
        conversation_id,
    ))
}

pub async fn list_profiles_handler(
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<ProfileRecord>>>, Json<StandardErrorResponse>> {
    match state.db.profiles().list().await {
        Ok(profiles) => Ok(Json(DataResponse::success(
            format!("{} tracked profile(s)", profiles.len()),
            profiles,
            None,
        ))),
        Err(e) => {
            error!("Failed to list profiles: {:#}", e);
            Err(database_error("list profiles", None))
        }
    }
}

pub async fn list_changes_handler(
    kind: Option<String>,
    limit: Option<u32>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<ChangeRecord>>>, Json<StandardErrorResponse>> {
    let kind = match kind.as_deref().filter(|k| !k.trim().is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<ChangeKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                return Err(Json(StandardErrorResponse::new(
                    e.to_string(),
                    "INVALID_KIND".to_string(),
                    vec![
                        "Use FOUNDER_TRANSITION, STEALTH_JOIN, NO_CHANGE or UNKNOWN".to_string(),
                    ],
                    None,
                )))
            }
        },
    };
    let limit = limit.unwrap_or(DEFAULT_CHANGES).clamp(1, MAX_CHANGES);

    match state.db.changes().recent(kind, limit).await {
        Ok(changes) => Ok(Json(DataResponse::success(
            format!("{} change event(s)", changes.len()),
            changes,
            None,
        ))),
        Err(e) => {
            error!("Failed to list changes: {:#}", e);
            Err(database_error("list changes", None))
        }
    }
}

pub async fn update_profile_status_handler(
    request: Json<StandardRequest<ProfileStatusRequest>>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    let conversation_id = request.conversation_id();

    let status = match request.data.status.parse::<TrackingStatus>() {
        Ok(status) => status,
        Err(e) => {
            return Err(Json(StandardErrorResponse::new(
                e.to_string(),
                "INVALID_STATUS".to_string(),
                vec!["Use ACTIVE or PAUSED".to_string()],
                conversation_id,
            )))
        }
    };

    let Some(id) = normalize_identifier(&request.data.id) else {
        return Err(Json(StandardErrorResponse::new(
            "Profile identifier is empty".to_string(),
            "INVALID_ID".to_string(),
            vec!["Pass the LinkedIn URL or id used in the CSV".to_string()],
            conversation_id,
        )));
    };

    match state.db.profiles().set_status(&id, status).await {
        Ok(true) => {
            info!("Profile {} set to {} via API", id, status);
            let next = match status {
                TrackingStatus::Paused => "Set status to ACTIVE to resume tracking",
                TrackingStatus::Active => "The profile is checked on the next run",
            };
            Ok(Json(
                ActionResponse::success(
                    format!("Profile {} is now {}", id, status),
                    "profile_status_updated".to_string(),
                    conversation_id,
                )
                .with_next_actions(vec![next.to_string()]),
            ))
        }
        Ok(false) => Err(Json(StandardErrorResponse::new(
            format!("Profile not found: {}", id),
            "PROFILE_NOT_FOUND".to_string(),
            vec!["Run a batch containing this profile first".to_string()],
            conversation_id,
        ))),
        Err(e) => {
            error!("Failed to update profile {}: {:#}", id, e);
            Err(database_error("update profile", conversation_id))
        }
    }
}
