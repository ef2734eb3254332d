use crate::domain::error::PaymentError;
use crate::domain::intent::IntentView;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct IssueRefundRequest {
    pub amount: Option<i64>,
    pub reason: Option<String>,
}

/// Public view of a refund row. Encrypted provider details stay out.
#[derive(Debug, Serialize)]
pub struct RefundView {
    pub refund_id: String,
    pub amount: i64,
    pub status: crate::domain::refund::RefundStatus,
    pub reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn issue_refund(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Json(req): Json<IssueRefundRequest>,
) -> Result<impl IntoResponse, PaymentError> {
    let intent = state
        .refund_engine
        .issue_refund(&payment_id, req.amount, req.reason)
        .await?;
    Ok(Json(IntentView::from(&intent)))
}

pub async fn list_refunds(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, PaymentError> {
    let intent = state
        .intents_repo
        .find_by_public_id(&payment_id)
        .await?
        .ok_or_else(|| PaymentError::not_found(format!("payment intent {payment_id}")))?;

    let refunds = state.refunds_repo.list_for_intent(intent.id).await?;
    let views: Vec<RefundView> = refunds
        .into_iter()
        .map(|r| RefundView {
            refund_id: r.public_id,
            amount: r.amount,
            status: r.status,
            reason: r.reason,
            created_at: r.created_at,
        })
        .collect();
    Ok(Json(views))
}
