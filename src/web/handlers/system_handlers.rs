// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::web::types::{AppState, DataResponse, SettingsView, StandardErrorResponse, TextResponse};

pub async fn settings_handler(state: &State<AppState>) -> Json<DataResponse<SettingsView>> {
    Json(DataResponse::success(
        "Effective detection settings".to_string(),
        state.settings.clone(),
        None,
    ))
}

pub async fn health_handler(
    state: &State<AppState>,
) -> Result<Json<TextResponse>, Json<StandardErrorResponse>> {
    match state.db.health_check().await {
        Ok(()) => {
            info!("Health check OK");
            Ok(Json(TextResponse::success("OK".to_string(), None)))
        }
        Err(e) => {
            error!("Health check failed: {:#}", e);
            Err(Json(StandardErrorResponse::new(
                "Database unavailable".to_string(),
                "DATABASE_ERROR".to_string(),
                vec!["Check the database path and permissions".to_string()],
                None,
            )))
        }
    }
}
