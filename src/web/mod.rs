// src/web/mod.rs
//! HTTP surface: upload a CSV batch, browse profiles, changes and runs, log outreach

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::info;

use crate::config::{AppConfig, ServerSettings};
use crate::core::Database;
use crate::types::{ChangeRecord, ProfileRecord, RunReport, RunSummary};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[post("/runs", data = "<upload>")]
pub async fn start_run(
    upload: Form<RunUploadForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<RunReport>>, Json<StandardErrorResponse>> {
    handlers::start_run_handler(upload, state).await
}

#[get("/runs?<limit>")]
pub async fn list_runs(
    limit: Option<u32>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<RunSummary>>>, Json<StandardErrorResponse>> {
    handlers::list_runs_handler(limit, state).await
}

#[get("/profiles")]
pub async fn list_profiles(
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<ProfileRecord>>>, Json<StandardErrorResponse>> {
    handlers::list_profiles_handler(state).await
}

#[post("/profiles/status", data = "<request>")]
pub async fn update_profile_status(
    request: Json<StandardRequest<ProfileStatusRequest>>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    handlers::update_profile_status_handler(request, state).await
}

#[get("/changes?<kind>&<limit>")]
pub async fn list_changes(
    kind: Option<String>,
    limit: Option<u32>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<ChangeRecord>>>, Json<StandardErrorResponse>> {
    handlers::list_changes_handler(kind, limit, state).await
}

#[post("/outreach", data = "<request>")]
pub async fn create_outreach(
    request: Json<StandardRequest<OutreachRequest>>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<OutreachView>>, Json<StandardErrorResponse>> {
    handlers::create_outreach_handler(request, state).await
}

#[get("/outreach?<profile>&<due>")]
pub async fn list_outreach(
    profile: Option<String>,
    due: Option<bool>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<OutreachView>>>, Json<StandardErrorResponse>> {
    handlers::list_outreach_handler(profile, due, state).await
}

#[post("/outreach/response", data = "<request>")]
pub async fn record_outreach_reply(
    request: Json<StandardRequest<OutreachReplyRequest>>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<OutreachView>>, Json<StandardErrorResponse>> {
    handlers::record_reply_handler(request, state).await
}

#[post("/outreach/follow-up", data = "<request>")]
pub async fn schedule_outreach_follow_up(
    request: Json<StandardRequest<OutreachFollowUpRequest>>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<OutreachView>>, Json<StandardErrorResponse>> {
    handlers::schedule_follow_up_handler(request, state).await
}

#[get("/settings")]
pub async fn settings(state: &State<AppState>) -> Json<DataResponse<SettingsView>> {
    handlers::settings_handler(state).await
}

#[get("/health")]
pub async fn health(
    state: &State<AppState>,
) -> Result<Json<TextResponse>, Json<StandardErrorResponse>> {
    handlers::health_handler(state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Unknown endpoint".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Endpoints live under /api".to_string()],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
        None,
    ))
}

pub fn build_rocket(state: AppState, server: &ServerSettings) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", server.port))
        .merge(("address", server.address.clone()));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register("/api", catchers![bad_request, not_found, internal_error])
        .mount(
            "/api",
            routes![
                start_run,
                list_runs,
                list_profiles,
                update_profile_status,
                list_changes,
                create_outreach,
                list_outreach,
                record_outreach_reply,
                schedule_outreach_follow_up,
                settings,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    config.ensure_directories().await?;

    let db = Database::new(&config.database_path).await?;
    let orchestrator = crate::pipeline::build_orchestrator(&config).await?;
    let state = AppState::new(db, orchestrator, &config);

    info!("Starting founder tracker API server");
    info!("Database: {}", config.database_path.display());
    info!("Notification channels: {:?}", state.settings.channels);

    let _rocket = build_rocket(state, &config.server)
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ChangeDetector;
    use crate::enrichment::EnrichmentClient;
    use crate::pipeline::RunOrchestrator;
    use crate::types::{ProfileData, TrackingStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use std::sync::Arc;

    struct FounderEverywhere;

    #[async_trait]
    impl EnrichmentClient for FounderEverywhere {
        async fn fetch(&self, id: &str) -> anyhow::Result<ProfileData> {
            Ok(ProfileData::new(id)
                .with_name("Jane Doe")
                .with_role(Some("Founder"), Some("NewCo")))
        }
    }

    async fn client() -> Client {
        let config = AppConfig::default();
        let db = Database::in_memory().await.unwrap();
        let orchestrator = RunOrchestrator::new(
            Arc::new(FounderEverywhere),
            ChangeDetector::new(&config.detection),
        );
        let state = AppState::new(db, orchestrator, &config);
        Client::tracked(build_rocket(state, &config.server))
            .await
            .unwrap()
    }

    fn multipart(filename: &str, content: &str) -> (ContentType, String) {
        let boundary = "X-TRACKER-BOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"csv_file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = boundary,
            f = filename,
            c = content
        );
        let content_type = ContentType::new("multipart", "form-data").with_params(("boundary", boundary));
        (content_type, body)
    }

    async fn post_json(client: &Client, uri: &'static str, body: String) -> serde_json::Value {
        client
            .post(uri)
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap()
    }

    #[rocket::async_test]
    async fn test_health_reports_ok() {
        let client = client().await;
        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["type"], "text");
    }

    #[rocket::async_test]
    async fn test_upload_runs_batch_and_lists_results() {
        let client = client().await;
        let (content_type, body) = multipart(
            "batch.csv",
            "id,name,title,company\n42,Jane Doe,Software Engineer,BigCo\n",
        );

        let response = client
            .post("/api/runs")
            .header(content_type)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["data"]["processed"], 1);
        assert_eq!(body["data"]["events"][0]["change_kind"], "FOUNDER_TRANSITION");

        let changes: serde_json::Value = client
            .get("/api/changes?kind=founder")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(changes["data"].as_array().map(Vec::len), Some(1));

        let runs: serde_json::Value = client
            .get("/api/runs")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(runs["data"][0]["source"], "batch.csv");
    }

    #[rocket::async_test]
    async fn test_upload_rejects_non_csv() {
        let client = client().await;
        let (content_type, body) = multipart("batch.txt", "id,name\n1,A\n");
        let response = client
            .post("/api/runs")
            .header(content_type)
            .body(body)
            .dispatch()
            .await;
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "INVALID_FORMAT");
    }

    #[rocket::async_test]
    async fn test_upload_rejects_missing_columns() {
        let client = client().await;
        let (content_type, body) = multipart("batch.csv", "title,company\nCTO,Acme\n");
        let response = client
            .post("/api/runs")
            .header(content_type)
            .body(body)
            .dispatch()
            .await;
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "INVALID_CSV");
    }

    #[rocket::async_test]
    async fn test_invalid_change_kind_is_rejected() {
        let client = client().await;
        let body: serde_json::Value = client
            .get("/api/changes?kind=promotion")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["error_code"], "INVALID_KIND");
    }

    #[rocket::async_test]
    async fn test_pause_profile_through_api() {
        let client = client().await;
        let state = client.rocket().state::<AppState>().unwrap();
        state
            .db
            .profiles()
            .upsert(&ProfileRecord::new("42", Utc::now()))
            .await
            .unwrap();

        let response = client
            .post("/api/profiles/status")
            .header(ContentType::JSON)
            .body(r#"{"id":"42","status":"paused","conversation_id":"c-1"}"#)
            .dispatch()
            .await;
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["type"], "action");
        assert_eq!(body["conversation_id"], "c-1");

        let stored = state.db.profiles().get("42").await.unwrap().unwrap();
        assert_eq!(stored.status_flag, TrackingStatus::Paused);

        let body: serde_json::Value = client
            .post("/api/profiles/status")
            .header(ContentType::JSON)
            .body(r#"{"id":"missing","status":"ACTIVE"}"#)
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["error_code"], "PROFILE_NOT_FOUND");
    }

    #[rocket::async_test]
    async fn test_settings_expose_keywords() {
        let client = client().await;
        let body: serde_json::Value = client
            .get("/api/settings")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["data"]["founder_keywords"][0], "founder");
        assert_eq!(body["data"]["channels"].as_array().map(Vec::len), Some(0));
    }
    #[rocket::async_test]
    async fn test_outreach_logged_against_archived_change() {
        let client = client().await;
        let (content_type, body) = multipart(
            "batch.csv",
            "id,name,title,company\n42,Jane Doe,Software Engineer,BigCo\n",
        );
        client
            .post("/api/runs")
            .header(content_type)
            .body(body)
            .dispatch()
            .await;

        let state = client.rocket().state::<AppState>().unwrap();
        let change = state.db.changes().for_profile("42").await.unwrap().remove(0);

        let body: serde_json::Value = client
            .post("/api/outreach")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"change_id":"{}","method":"linkedin","follow_up_days":0,"conversation_id":"c-2"}}"#,
                change.event.id
            ))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["conversation_id"], "c-2");
        assert_eq!(body["data"]["method"], "LINKEDIN");
        assert_eq!(body["data"]["profile_id"], "42");
        assert_eq!(body["data"]["status"], "FOLLOW_UP_DUE");
        let outreach_id = body["data"]["id"].as_str().unwrap().to_string();

        let due: serde_json::Value = client
            .get("/api/outreach?due=true")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(due["data"].as_array().map(Vec::len), Some(1));

        let body: serde_json::Value = client
            .post("/api/outreach/response")
            .header(ContentType::JSON)
            .body(format!(r#"{{"id":"{}","notes":"Call booked"}}"#, outreach_id))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["data"]["status"], "RESPONDED");
        assert_eq!(body["data"]["needs_follow_up"], false);

        let due: serde_json::Value = client
            .get("/api/outreach?due=true")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(due["data"].as_array().map(Vec::len), Some(0));

        let listed: serde_json::Value = client
            .get("/api/outreach?profile=42")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let notes = listed["data"][0]["notes"].as_str().unwrap();
        assert!(notes.ends_with("Call booked"));
    }

    #[rocket::async_test]
    async fn test_outreach_rejects_unknown_change_and_bad_input() {
        let client = client().await;

        let body = post_json(
            &client,
            "/api/outreach",
            format!(r#"{{"change_id":"{}"}}"#, uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(body["error_code"], "CHANGE_NOT_FOUND");

        let body = post_json(
            &client,
            "/api/outreach",
            r#"{"change_id":"not-a-uuid"}"#.to_string(),
        )
        .await;
        assert_eq!(body["error_code"], "INVALID_ID");

        let body = post_json(
            &client,
            "/api/outreach",
            format!(r#"{{"change_id":"{}","method":"fax"}}"#, uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(body["error_code"], "INVALID_METHOD");

        let body = post_json(
            &client,
            "/api/outreach/follow-up",
            format!(r#"{{"id":"{}","days":3}}"#, uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(body["error_code"], "OUTREACH_NOT_FOUND");

        let body = post_json(
            &client,
            "/api/outreach/follow-up",
            format!(r#"{{"id":"{}","days":-1}}"#, uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(body["error_code"], "INVALID_FOLLOW_UP");
    }
}
