use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

pub fn is_local_origin(origin: Option<&str>) -> bool {
    origin.is_some_and(|o| o.contains("localhost") || o.contains("127.0.0.1"))
}

/// Lets administrative requests through only from a local origin when running
/// in production. Development instances accept any origin.
pub async fn require_trusted_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|hv| hv.to_str().ok());

    if state.config.is_production() && !is_local_origin(origin) {
        warn!(origin = ?origin, "rejected provisioning request from untrusted origin");
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_origins() {
        assert!(is_local_origin(Some("http://localhost:3000")));
        assert!(is_local_origin(Some("http://127.0.0.1:8080")));
        assert!(!is_local_origin(Some("https://fusionfest.example.org")));
        assert!(!is_local_origin(None));
    }
}
