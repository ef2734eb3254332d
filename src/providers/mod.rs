use crate::domain::error::PaymentError;
use crate::domain::intent::{IntentStatus, PaymentProvider};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;

pub mod card;
pub mod escrow;
pub mod executor;
pub mod token_cache;
pub mod wallet;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub reference: String,
    pub receipt_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderCharge {
    pub provider_ref: String,
    pub client_artifact: Option<String>,
    pub status: IntentStatus,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundRequest {
    pub provider_ref: String,
    pub amount_minor: i64,
    pub currency: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderRefund {
    pub provider_refund_ref: String,
    pub succeeded: bool,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEventKind {
    PaymentSucceeded,
    PaymentFailed,
    PaymentCanceled,
    Refunded,
    Ignored,
}

/// Canonical view of one upstream webhook event after signature verification.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub event_id: String,
    pub kind: ProviderEventKind,
    pub provider_ref: Option<String>,
    pub amount_minor: Option<i64>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

/// Raw upstream failure before retry classification.
#[derive(Debug, Error)]
#[error("upstream error (status {status:?}): {message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub transport: bool,
    pub message: String,
}

impl UpstreamError {
    pub fn retryable(&self) -> bool {
        self.transport || matches!(self.status, Some(429 | 500..=599))
    }

    pub async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Self {
            status: Some(status),
            transport: false,
            message: body.chars().take(200).collect(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            transport: err.status().is_none(),
            message: err.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait ProviderGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ProviderCharge, UpstreamError>;

    async fn capture_payment(&self, provider_ref: &str) -> Result<ProviderCharge, UpstreamError>;

    async fn refund_payment(&self, request: &RefundRequest) -> Result<ProviderRefund, UpstreamError>;

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, PaymentError>;
}

/// Closed dispatch over the three supported providers.
#[derive(Clone)]
pub struct ProviderSet {
    pub card: Arc<dyn ProviderGateway>,
    pub wallet: Arc<dyn ProviderGateway>,
    pub escrow: Arc<dyn ProviderGateway>,
}

impl ProviderSet {
    pub fn get(&self, provider: PaymentProvider) -> Arc<dyn ProviderGateway> {
        match provider {
            PaymentProvider::Card => self.card.clone(),
            PaymentProvider::Wallet => self.wallet.clone(),
            PaymentProvider::Escrow => self.escrow.clone(),
        }
    }
}

/// Verifies a `t=<ts>,v1=<hex hmac>` signature header over
/// `"{timestamp}.{payload}"`. All three providers sign deliveries with this
/// scheme.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in signature_header.split(',') {
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signature = Some(rest);
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(PaymentError::SignatureInvalid);
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::SignatureInvalid)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    let provided = hex::decode(signature).map_err(|_| PaymentError::SignatureInvalid)?;
    if expected[..] != provided[..] {
        return Err(PaymentError::SignatureInvalid);
    }

    Ok(())
}
