// src/web/handlers/outreach_handlers.rs
use chrono::{Duration, Utc};
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};
use uuid::Uuid;

use crate::types::{OutreachMethod, OutreachRecord};
use crate::utils::normalize_identifier;
use crate::web::types::{
    AppState, DataResponse, OutreachFollowUpRequest, OutreachReplyRequest, OutreachRequest,
    OutreachView, StandardErrorResponse, StandardRequest, WithConversationId,
};

const MAX_FOLLOW_UP_DAYS: i64 = 365;

type OutreachResult = Result<Json<DataResponse<OutreachView>>, Json<StandardErrorResponse>>;

fn error_response(
    message: String,
    code: &str,
    suggestions: &[&str],
    conversation_id: Option<String>,
) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        message,
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
        conversation_id,
    ))
}

fn parse_id(
    raw: &str,
    what: &str,
    conversation_id: &Option<String>,
) -> Result<Uuid, Json<StandardErrorResponse>> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        error_response(
            format!("Invalid {} id: {}", what, raw),
            "INVALID_ID",
            &["Ids are UUIDs as returned by /api/changes and /api/outreach"],
            conversation_id.clone(),
        )
    })
}

fn follow_up_offset(
    days: i64,
    conversation_id: &Option<String>,
) -> Result<Duration, Json<StandardErrorResponse>> {
    if !(0..=MAX_FOLLOW_UP_DAYS).contains(&days) {
        return Err(error_response(
            format!("Follow-up must be 0 to {} days away, got {}", MAX_FOLLOW_UP_DAYS, days),
            "INVALID_FOLLOW_UP",
            &["Pass a whole number of days"],
            conversation_id.clone(),
        ));
    }
    Ok(Duration::days(days))
}

fn outreach_not_found(id: Uuid, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    error_response(
        format!("Outreach not found: {}", id),
        "OUTREACH_NOT_FOUND",
        &["List outreach with GET /api/outreach"],
        conversation_id,
    )
}

fn database_error(what: &str, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    error_response(
        format!("Failed to {}", what),
        "DATABASE_ERROR",
        &["Try again in a few moments"],
        conversation_id,
    )
}

fn view(message: String, record: OutreachRecord, conversation_id: Option<String>) -> OutreachResult {
    Ok(Json(DataResponse::success(
        message,
        OutreachView::at(record, Utc::now()),
        conversation_id,
    )))
}

pub async fn create_outreach_handler(
    request: Json<StandardRequest<OutreachRequest>>,
    state: &State<AppState>,
) -> OutreachResult {
    let conversation_id = request.conversation_id();
    let change_id = parse_id(&request.data.change_id, "change", &conversation_id)?;

    let method = match request.data.method.as_deref() {
        None => OutreachMethod::Email,
        Some(raw) => raw.parse::<OutreachMethod>().map_err(|e| {
            error_response(
                e.to_string(),
                "INVALID_METHOD",
                &["Use EMAIL, LINKEDIN, PHONE, MEETING or OTHER"],
                conversation_id.clone(),
            )
        })?,
    };

    let follow_up_at = match request.data.follow_up_days {
        Some(days) => Some(Utc::now() + follow_up_offset(days, &conversation_id)?),
        None => None,
    };

    let notes = request.data.notes.as_deref();
    match state
        .db
        .outreach()
        .create(change_id, method, notes, follow_up_at)
        .await
    {
        Ok(Some(record)) => {
            info!("Outreach {} logged via API", record.id);
            view(
                format!("Outreach logged for {}", record.profile_id),
                record,
                conversation_id,
            )
        }
        Ok(None) => Err(error_response(
            format!("Change event not found: {}", change_id),
            "CHANGE_NOT_FOUND",
            &["List archived changes with GET /api/changes"],
            conversation_id,
        )),
        Err(e) => {
            error!("Failed to log outreach for {}: {:#}", change_id, e);
            Err(database_error("log outreach", conversation_id))
        }
    }
}

pub async fn list_outreach_handler(
    profile: Option<String>,
    due: Option<bool>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<OutreachView>>>, Json<StandardErrorResponse>> {
    let now = Utc::now();
    let result = if due.unwrap_or(false) {
        state.db.outreach().due(now).await
    } else {
        let profile = profile.as_deref().and_then(normalize_identifier);
        state.db.outreach().list(profile.as_deref()).await
    };

    match result {
        Ok(records) => {
            let views: Vec<OutreachView> = records
                .into_iter()
                .map(|r| OutreachView::at(r, now))
                .collect();
            Ok(Json(DataResponse::success(
                format!("{} outreach record(s)", views.len()),
                views,
                None,
            )))
        }
        Err(e) => {
            error!("Failed to list outreach: {:#}", e);
            Err(database_error("list outreach", None))
        }
    }
}

pub async fn record_reply_handler(
    request: Json<StandardRequest<OutreachReplyRequest>>,
    state: &State<AppState>,
) -> OutreachResult {
    let conversation_id = request.conversation_id();
    let id = parse_id(&request.data.id, "outreach", &conversation_id)?;

    match state
        .db
        .outreach()
        .mark_received(id, request.data.notes.as_deref())
        .await
    {
        Ok(Some(record)) => view(
            format!("Response recorded for {}", record.profile_id),
            record,
            conversation_id,
        ),
        Ok(None) => Err(outreach_not_found(id, conversation_id)),
        Err(e) => {
            error!("Failed to record response for {}: {:#}", id, e);
            Err(database_error("record response", conversation_id))
        }
    }
}

pub async fn schedule_follow_up_handler(
    request: Json<StandardRequest<OutreachFollowUpRequest>>,
    state: &State<AppState>,
) -> OutreachResult {
    let conversation_id = request.conversation_id();
    let id = parse_id(&request.data.id, "outreach", &conversation_id)?;
    let at = Utc::now() + follow_up_offset(request.data.days, &conversation_id)?;

    match state
        .db
        .outreach()
        .schedule_follow_up(id, at, request.data.notes.as_deref())
        .await
    {
        Ok(Some(record)) => view(
            format!("Follow-up scheduled for {}", at.format("%Y-%m-%d")),
            record,
            conversation_id,
        ),
        Ok(None) => Err(outreach_not_found(id, conversation_id)),
        Err(e) => {
            error!("Failed to schedule follow-up for {}: {:#}", id, e);
            Err(database_error("schedule follow-up", conversation_id))
        }
    }
}
