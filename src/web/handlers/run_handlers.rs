// src/web/handlers/run_handlers.rs
use rocket::form::Form;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::ingest::load_profiles;
use crate::types::{RunReport, RunSummary};
use crate::utils::{remove_temp_file, validate_file_extension};
use crate::web::types::{AppState, DataResponse, RunUploadForm, StandardErrorResponse};

const MAX_RUNS: u32 = 200;

pub async fn start_run_handler(
    mut upload: Form<RunUploadForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<RunReport>>, Json<StandardErrorResponse>> {
    if let Some(raw_name) = upload.csv_file.raw_name() {
        let raw_name = raw_name.dangerous_unsafe_unsanitized_raw().as_str();
        if let Err(e) = validate_file_extension(raw_name, &["csv"]) {
            return Err(Json(StandardErrorResponse::new(
                e.to_string(),
                "INVALID_FORMAT".to_string(),
                vec!["Upload a .csv file".to_string()],
                None,
            )));
        }
    }

    let source = upload
        .csv_file
        .name()
        .map(|n| format!("{}.csv", n))
        .unwrap_or_else(|| "upload.csv".to_string());

    let temp_path = std::env::temp_dir().join(format!("profiles_upload_{}.csv", uuid::Uuid::new_v4()));
    if let Err(e) = upload.csv_file.persist_to(&temp_path).await {
        error!("Failed to save uploaded CSV: {}", e);
        return Err(Json(StandardErrorResponse::new(
            "Failed to process uploaded file".to_string(),
            "FILE_SAVE_ERROR".to_string(),
            vec!["Try uploading the file again".to_string()],
            None,
        )));
    }

    let parsed = load_profiles(&temp_path);
    remove_temp_file(&temp_path).await;

    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Rejected CSV {}: {:#}", source, e);
            return Err(Json(StandardErrorResponse::new(
                format!("{:#}", e),
                "INVALID_CSV".to_string(),
                vec![
                    "Include an identifier column (id, profile_id, linkedin_url, profile_url or url)"
                        .to_string(),
                    "Include a name column (name or full_name)".to_string(),
                ],
                None,
            )));
        }
    };

    let _guard = state.run_lock.lock().await;
    info!("Starting run for uploaded file {}", source);

    match state.orchestrator.run(&state.db, &source, parsed).await {
        Ok(report) => {
            let message = format!(
                "Processed {} of {} row(s): {} change(s), {} alert(s)",
                report.processed,
                report.rows_total,
                report.events.len(),
                report.alerts()
            );
            Ok(Json(DataResponse::success(message, report, None)))
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            Err(Json(StandardErrorResponse::new(
                "Run failed".to_string(),
                "RUN_ERROR".to_string(),
                vec!["Check the server logs".to_string()],
                None,
            )))
        }
    }
}

pub async fn list_runs_handler(
    limit: Option<u32>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<Vec<RunSummary>>>, Json<StandardErrorResponse>> {
    let limit = limit.unwrap_or(20).clamp(1, MAX_RUNS);

    match state.db.runs().recent(limit).await {
        Ok(runs) => Ok(Json(DataResponse::success(
            format!("{} run(s)", runs.len()),
            runs,
            None,
        ))),
        Err(e) => {
            error!("Failed to list runs: {:#}", e);
            Err(Json(StandardErrorResponse::new(
                "Failed to list runs".to_string(),
                "DATABASE_ERROR".to_string(),
                vec!["Try again in a few moments".to_string()],
                None,
            )))
        }
    }
}
