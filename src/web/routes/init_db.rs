use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::services::{health_service, schema_service};
use crate::state::AppState;

pub async fn provision_handler(State(state): State<AppState>) -> Response {
    match schema_service::ensure_schema(state.store.as_ref()).await {
        Ok(report) => {
            let status = if report.is_ready() {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(report)).into_response()
        }
        Err(e) => {
            error!("Database init error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Database connection error" })),
            )
                .into_response()
        }
    }
}

pub async fn status_handler(State(state): State<AppState>) -> Response {
    let report = health_service::check_health(state.store.as_ref()).await;
    (StatusCode::OK, Json(report)).into_response()
}
