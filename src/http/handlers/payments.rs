use crate::domain::error::PaymentError;
use crate::domain::intent::{CreatePaymentIntentRequest, IntentView};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LedgerEntryView {
    pub entry_type: String,
    pub amount: i64,
    pub provider_ref: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct LedgerView {
    pub entries: Vec<LedgerEntryView>,
    pub balance: i64,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, PaymentError> {
    let resp = state.payment_service.create_payment_intent(req).await?;
    Ok(Json(resp))
}

pub async fn capture_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentError> {
    let intent = state.payment_service.capture_order(&payment_id).await?;
    Ok(Json(IntentView::from(&intent)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentError> {
    let intent = state
        .intents_repo
        .find_by_public_id(&payment_id)
        .await?
        .ok_or_else(|| PaymentError::not_found(format!("payment intent {payment_id}")))?;
    Ok(Json(IntentView::from(&intent)))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentError> {
    let intent = state
        .intents_repo
        .find_by_public_id(&payment_id)
        .await?
        .ok_or_else(|| PaymentError::not_found(format!("payment intent {payment_id}")))?;

    let entries = state.ledger_repo.list_for_intent(intent.id).await?;
    let balance = state.ledger_repo.sum_for_intent(intent.id).await?;
    Ok(Json(LedgerView {
        entries: entries
            .into_iter()
            .map(|e| LedgerEntryView {
                entry_type: e.entry_type.as_str().to_string(),
                amount: e.amount,
                provider_ref: e.provider_ref,
                created_at: e.created_at,
            })
            .collect(),
        balance,
    }))
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
