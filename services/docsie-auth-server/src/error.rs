//! Request-level error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Errors returned to HTTP callers as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("failed to issue token: {0}")]
    Issue(#[from] docsie_auth::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::NotConfigured(_) => StatusCode::BAD_REQUEST,
            ApiError::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for `docsie_requests_rejected_total`.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::NotConfigured(_) => "not_configured",
            ApiError::Issue(_) => "signing",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        crate::metrics::record_rejected(self.reason());

        // Signing failures keep their detail in the log only
        let message = match &self {
            ApiError::Issue(e) => {
                error!(error = %e, "token issuance failed");
                "Failed to issue token".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
