use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures reported by a storage client, independent of the vendor's error encoding.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("relation {0} does not exist")]
    RelationNotFound(String),

    #[error("storage client cannot execute schema statements")]
    SchemaUnsupported,

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn is_relation_not_found(&self) -> bool {
        matches!(self, StoreError::RelationNotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Template render failed: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Render(e) => {
                tracing::error!("template render failed: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
