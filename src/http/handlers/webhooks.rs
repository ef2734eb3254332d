use crate::domain::error::PaymentError;
use crate::domain::intent::PaymentProvider;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentError> {
    let provider = PaymentProvider::parse(&provider)
        .ok_or_else(|| PaymentError::not_found(format!("provider {provider}")))?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::SignatureInvalid)?;

    let outcome = state
        .webhook_processor
        .handle(provider, &body, signature)
        .await?;
    Ok(Json(outcome))
}
