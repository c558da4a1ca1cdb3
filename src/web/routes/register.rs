use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::models::{RegistrationPayload, RegistrationRow};
use crate::services::registration_service::{self, RegistrationError};
use crate::state::AppState;

/// Body of every `/register` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<RegistrationRow>>,
}

impl RegisterReply {
    fn failure(error: &RegistrationError) -> Self {
        let fields = match error {
            RegistrationError::MissingFields(names) => {
                Some(names.iter().map(|n| n.to_string()).collect())
            }
            _ => None,
        };
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            fields,
            data: None,
        }
    }
}

pub fn reply_for(result: Result<RegistrationRow, RegistrationError>) -> (StatusCode, RegisterReply) {
    match result {
        Ok(created) => (
            StatusCode::CREATED,
            RegisterReply {
                success: true,
                message: Some("Registration successful!".to_string()),
                error: None,
                fields: None,
                data: Some(vec![created]),
            },
        ),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, RegisterReply::failure(&e))
        }
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterReply>), AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Unreadable registration body: {}", e);
        AppError::MalformedPayload
    })?;

    let result = registration_service::submit(state.store.as_ref(), &payload).await;
    let (status, reply) = reply_for(result);
    Ok((status, Json(reply)))
}
