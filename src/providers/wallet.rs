use crate::domain::error::PaymentError;
use crate::domain::intent::{IntentStatus, PaymentProvider};
use crate::providers::token_cache::TokenCache;
use crate::providers::{
    verify_signature, ChargeRequest, ProviderCharge, ProviderEvent, ProviderEventKind,
    ProviderGateway, RefundRequest, ProviderRefund, UpstreamError,
};
use serde::Deserialize;
use serde_json::json;

/// Wallet provider speaking a PayPal-style orders API. The OAuth access token
/// lives in an explicit TTL cache owned by this instance.
pub struct WalletProvider {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub webhook_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
    pub token_cache: TokenCache,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct WalletOrder {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<WalletLink>,
}

#[derive(Debug, Deserialize)]
struct WalletLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct WalletEvent {
    id: String,
    event_type: String,
    resource: serde_json::Value,
}

pub fn normalize_status(native: &str) -> IntentStatus {
    match native {
        "CREATED" | "PAYER_ACTION_REQUIRED" => IntentStatus::RequiresAction,
        "APPROVED" | "SAVED" | "PENDING" => IntentStatus::Processing,
        "COMPLETED" => IntentStatus::Succeeded,
        "VOIDED" | "CANCELLED" => IntentStatus::Canceled,
        _ => IntentStatus::Failed,
    }
}

/// Wallet amounts go over the wire as decimal strings in major units.
fn decimal_value(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}

impl WalletProvider {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    async fn access_token(&self) -> Result<String, UpstreamError> {
        if let Some(token) = self.token_cache.get().await {
            return Ok(token);
        }

        let resp = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let parsed: TokenResponse = resp.json().await?;
        let ttl = std::time::Duration::from_secs(parsed.expires_in.saturating_sub(60).max(30));
        self.token_cache.put(parsed.access_token.clone(), ttl).await;
        Ok(parsed.access_token)
    }

    /// A 401 means the cached token went stale server-side; drop it so the
    /// next attempt re-authenticates instead of replaying the dead token.
    async fn fail_from(&self, resp: reqwest::Response) -> UpstreamError {
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.token_cache.clear().await;
        }
        UpstreamError::from_response(resp).await
    }

    fn charge_from(&self, order: WalletOrder) -> ProviderCharge {
        let approval = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone());
        let status = normalize_status(&order.status);
        ProviderCharge {
            provider_ref: order.id,
            client_artifact: approval,
            status,
            failure_code: None,
            failure_message: None,
        }
    }
}

#[async_trait::async_trait]
impl ProviderGateway for WalletProvider {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Wallet
    }

    async fn create_payment(
        &self,
        request: &ChargeRequest,
    ) -> Result<ProviderCharge, UpstreamError> {
        let token = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": request.reference,
                "amount": {
                    "currency_code": request.currency,
                    "value": decimal_value(request.amount_minor),
                }
            }]
        });

        let resp = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(self.fail_from(resp).await);
        }

        let parsed: WalletOrder = resp.json().await?;
        Ok(self.charge_from(parsed))
    }

    async fn capture_payment(&self, provider_ref: &str) -> Result<ProviderCharge, UpstreamError> {
        let token = self.access_token().await?;
        let resp = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, provider_ref
            ))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(self.fail_from(resp).await);
        }

        let parsed: serde_json::Value = resp.json().await?;
        let order_id = parsed
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(provider_ref)
            .to_string();
        let status = parsed.get("status").and_then(|v| v.as_str()).unwrap_or("");
        let capture_id = parsed
            .pointer("/purchase_units/0/payments/captures/0/id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(ProviderCharge {
            provider_ref: capture_id.unwrap_or(order_id),
            client_artifact: None,
            status: normalize_status(status),
            failure_code: None,
            failure_message: None,
        })
    }

    async fn refund_payment(
        &self,
        request: &RefundRequest,
    ) -> Result<ProviderRefund, UpstreamError> {
        let token = self.access_token().await?;
        let body = json!({
            "amount": {
                "currency_code": request.currency,
                "value": decimal_value(request.amount_minor),
            },
            "note_to_payer": request.reason,
        });

        let resp = self
            .client
            .post(format!(
                "{}/v2/payments/captures/{}/refund",
                self.base_url, request.provider_ref
            ))
            .bearer_auth(&token)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(self.fail_from(resp).await);
        }

        let parsed: serde_json::Value = resp.json().await?;
        let refund_id = parsed
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let status = parsed.get("status").and_then(|v| v.as_str()).unwrap_or("");

        Ok(ProviderRefund {
            provider_refund_ref: refund_id,
            succeeded: matches!(status, "COMPLETED" | "PENDING"),
            failure_code: None,
            failure_message: None,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, PaymentError> {
        verify_signature(&self.webhook_secret, payload, signature)?;

        let event: WalletEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::validation(format!("malformed wallet event: {e}")))?;

        let resource_id = event
            .resource
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let kind = match event.event_type.as_str() {
            "PAYMENT.CAPTURE.COMPLETED" => ProviderEventKind::PaymentSucceeded,
            "PAYMENT.CAPTURE.DENIED" | "PAYMENT.CAPTURE.DECLINED" => {
                ProviderEventKind::PaymentFailed
            }
            "CHECKOUT.ORDER.VOIDED" => ProviderEventKind::PaymentCanceled,
            "PAYMENT.CAPTURE.REFUNDED" => ProviderEventKind::Refunded,
            _ => ProviderEventKind::Ignored,
        };

        let amount = event
            .resource
            .pointer("/amount/value")
            .and_then(|v| v.as_str())
            .and_then(parse_decimal_minor);

        Ok(ProviderEvent {
            event_id: event.id,
            kind,
            provider_ref: resource_id,
            amount_minor: amount,
            failure_code: None,
            failure_message: None,
        })
    }
}

fn parse_decimal_minor(value: &str) -> Option<i64> {
    let (major, minor) = value.split_once('.').unwrap_or((value, "0"));
    let major: i64 = major.parse().ok()?;
    let cents: i64 = format!("{:0<2}", minor).get(0..2)?.parse().ok()?;
    Some(major * 100 + cents)
}
