use crate::domain::error::PaymentError;
use crate::domain::intent::{IntentStatus, PaymentProvider};
use crate::providers::{
    verify_signature, ChargeRequest, ProviderCharge, ProviderEvent, ProviderEventKind,
    ProviderGateway, RefundRequest, ProviderRefund, UpstreamError,
};
use serde::Deserialize;
use serde_json::json;

/// Escrow provider: funds are held until released. JSON API keyed by a
/// static api key.
pub struct EscrowProvider {
    pub base_url: String,
    pub api_key: String,
    pub webhook_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EscrowResponse {
    id: String,
    status: String,
    failure_code: Option<String>,
    failure_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EscrowEvent {
    event_id: String,
    event_type: String,
    escrow_id: Option<String>,
    amount: Option<i64>,
    failure_code: Option<String>,
    failure_message: Option<String>,
}

pub fn normalize_status(native: &str) -> IntentStatus {
    match native {
        "created" => IntentStatus::RequiresAction,
        "funded" | "held" => IntentStatus::Processing,
        "released" | "completed" => IntentStatus::Succeeded,
        "cancelled" | "canceled" => IntentStatus::Canceled,
        "refunded" => IntentStatus::Refunded,
        _ => IntentStatus::Failed,
    }
}

impl EscrowProvider {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    fn charge_from(&self, resp: EscrowResponse) -> ProviderCharge {
        ProviderCharge {
            client_artifact: Some(resp.id.clone()),
            status: normalize_status(&resp.status),
            provider_ref: resp.id,
            failure_code: resp.failure_code,
            failure_message: resp.failure_message,
        }
    }
}

#[async_trait::async_trait]
impl ProviderGateway for EscrowProvider {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Escrow
    }

    async fn create_payment(
        &self,
        request: &ChargeRequest,
    ) -> Result<ProviderCharge, UpstreamError> {
        let body = json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "reference": request.reference,
        });

        let resp = self
            .client
            .post(format!("{}/v1/escrows", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: EscrowResponse = resp.json().await?;
        Ok(self.charge_from(parsed))
    }

    async fn capture_payment(&self, provider_ref: &str) -> Result<ProviderCharge, UpstreamError> {
        let resp = self
            .client
            .post(format!("{}/v1/escrows/{}/release", self.base_url, provider_ref))
            .header("X-Api-Key", &self.api_key)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: EscrowResponse = resp.json().await?;
        let mut charge = self.charge_from(parsed);
        charge.client_artifact = None;
        Ok(charge)
    }

    async fn refund_payment(
        &self,
        request: &RefundRequest,
    ) -> Result<ProviderRefund, UpstreamError> {
        let body = json!({
            "amount": request.amount_minor,
            "reason": request.reason,
        });

        let resp = self
            .client
            .post(format!(
                "{}/v1/escrows/{}/refund",
                self.base_url, request.provider_ref
            ))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: EscrowResponse = resp.json().await?;
        let succeeded = matches!(parsed.status.as_str(), "refunded" | "refund_pending");
        Ok(ProviderRefund {
            provider_refund_ref: parsed.id,
            succeeded,
            failure_code: parsed.failure_code,
            failure_message: parsed.failure_message,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, PaymentError> {
        verify_signature(&self.webhook_secret, payload, signature)?;

        let event: EscrowEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::validation(format!("malformed escrow event: {e}")))?;

        let kind = match event.event_type.as_str() {
            "escrow.released" | "escrow.completed" => ProviderEventKind::PaymentSucceeded,
            "escrow.failed" => ProviderEventKind::PaymentFailed,
            "escrow.cancelled" => ProviderEventKind::PaymentCanceled,
            "escrow.refunded" => ProviderEventKind::Refunded,
            _ => ProviderEventKind::Ignored,
        };

        Ok(ProviderEvent {
            event_id: event.event_id,
            kind,
            provider_ref: event.escrow_id,
            amount_minor: event.amount,
            failure_code: event.failure_code,
            failure_message: event.failure_message,
        })
    }
}
