use crate::domain::error::PaymentError;
use crate::domain::intent::{IntentStatus, PaymentProvider};
use crate::providers::{
    verify_signature, ChargeRequest, ProviderCharge, ProviderEvent, ProviderEventKind,
    ProviderGateway, RefundRequest, ProviderRefund, UpstreamError,
};
use serde::Deserialize;

/// Card-network provider speaking a Stripe-style form-encoded intents API.
pub struct CardProvider {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CardIntentResponse {
    id: String,
    status: String,
    client_secret: Option<String>,
    last_payment_error: Option<CardError>,
    latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardRefundResponse {
    id: String,
    status: String,
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardEvent {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    data: CardEventData,
}

#[derive(Debug, Deserialize)]
struct CardEventData {
    object: serde_json::Value,
}

/// Native status vocabulary -> canonical state, one mapping per provider.
pub fn normalize_status(native: &str) -> IntentStatus {
    match native {
        "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
        "requires_action" | "requires_confirmation" | "requires_capture" => {
            IntentStatus::RequiresAction
        }
        "processing" => IntentStatus::Processing,
        "succeeded" => IntentStatus::Succeeded,
        "canceled" => IntentStatus::Canceled,
        _ => IntentStatus::Failed,
    }
}

impl CardProvider {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    fn charge_from(&self, resp: CardIntentResponse) -> ProviderCharge {
        let (failure_code, failure_message) = resp
            .last_payment_error
            .map(|e| (e.code, e.message))
            .unwrap_or((None, None));
        ProviderCharge {
            provider_ref: resp.id,
            client_artifact: resp.client_secret,
            status: normalize_status(&resp.status),
            failure_code,
            failure_message,
        }
    }
}

#[async_trait::async_trait]
impl ProviderGateway for CardProvider {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Card
    }

    async fn create_payment(
        &self,
        request: &ChargeRequest,
    ) -> Result<ProviderCharge, UpstreamError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("metadata[reference]".to_string(), request.reference.clone()),
        ];
        if let Some(email) = &request.receipt_email {
            form.push(("receipt_email".to_string(), email.clone()));
        }

        let resp = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: CardIntentResponse = resp.json().await?;
        Ok(self.charge_from(parsed))
    }

    async fn capture_payment(&self, provider_ref: &str) -> Result<ProviderCharge, UpstreamError> {
        let resp = self
            .client
            .post(format!(
                "{}/v1/payment_intents/{}/capture",
                self.base_url, provider_ref
            ))
            .bearer_auth(&self.secret_key)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: CardIntentResponse = resp.json().await?;
        let mut charge = self.charge_from(parsed);
        charge.client_artifact = None;
        Ok(charge)
    }

    async fn refund_payment(
        &self,
        request: &RefundRequest,
    ) -> Result<ProviderRefund, UpstreamError> {
        let form = [
            ("payment_intent".to_string(), request.provider_ref.clone()),
            ("amount".to_string(), request.amount_minor.to_string()),
        ];

        let resp = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: CardRefundResponse = resp.json().await?;
        let succeeded = matches!(parsed.status.as_str(), "succeeded" | "pending");
        Ok(ProviderRefund {
            provider_refund_ref: parsed.id,
            succeeded,
            failure_code: parsed.failure_reason,
            failure_message: None,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, PaymentError> {
        verify_signature(&self.webhook_secret, payload, signature)?;

        let event: CardEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::validation(format!("malformed card event: {e}")))?;

        let object = &event.data.object;
        let object_id = object.get("id").and_then(|v| v.as_str()).map(str::to_string);

        let (kind, provider_ref, amount) = match event.type_.as_str() {
            "payment_intent.succeeded" => (ProviderEventKind::PaymentSucceeded, object_id, None),
            "payment_intent.payment_failed" => (ProviderEventKind::PaymentFailed, object_id, None),
            "payment_intent.canceled" => (ProviderEventKind::PaymentCanceled, object_id, None),
            "charge.refunded" => {
                let intent_ref = object
                    .get("payment_intent")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .or(object_id);
                // `amount` is what this event refunded, not a running total.
                let amount = object.get("amount").and_then(|v| v.as_i64());
                (ProviderEventKind::Refunded, intent_ref, amount)
            }
            _ => (ProviderEventKind::Ignored, object_id, None),
        };

        let (failure_code, failure_message) = match kind {
            ProviderEventKind::PaymentFailed => {
                let err = object.get("last_payment_error");
                (
                    err.and_then(|e| e.get("code"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    err.and_then(|e| e.get("message"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                )
            }
            _ => (None, None),
        };

        Ok(ProviderEvent {
            event_id: event.id,
            kind,
            provider_ref,
            amount_minor: amount,
            failure_code,
            failure_message,
        })
    }
}
