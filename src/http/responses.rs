use crate::domain::error::PaymentError;
use crate::domain::intent::{ErrorEnvelope, ErrorPayload};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PaymentError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            PaymentError::SignatureInvalid => (StatusCode::BAD_REQUEST, "SIGNATURE_INVALID"),
            PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PaymentError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            PaymentError::CircuitOpen { .. } => (StatusCode::SERVICE_UNAVAILABLE, "CIRCUIT_OPEN"),
            PaymentError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE"),
            PaymentError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("request failed: {self:#}");
        }

        let details = match &self {
            PaymentError::Upstream { status, .. } => status.map(|s| format!("upstream status {s}")),
            _ => None,
        };
        // Internal details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorEnvelope {
            error: ErrorPayload {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
