use crate::domain::error::PaymentError;
use crate::domain::intent::PaymentProvider;
use crate::providers::{ProviderEvent, ProviderEventKind, ProviderSet};
use crate::repo::webhook_receipts_repo::WebhookReceiptsRepo;
use crate::service::intent_ledger::{IntentKey, PaymentIntentLedger};
use serde::Serialize;

pub const RECEIPT_PROCESSING: &str = "processing";
pub const RECEIPT_PROCESSED: &str = "processed";
pub const RECEIPT_DUPLICATE: &str = "duplicate";
pub const RECEIPT_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    pub duplicate: bool,
}

/// What to do with a delivery given the receipt already stored for its
/// event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimDecision {
    /// First sighting; this delivery owns the processing.
    Process,
    /// A previous attempt failed; the redelivery gets another chance.
    Reprocess,
    /// Already processed, or another in-flight delivery owns it.
    Duplicate,
}

pub fn claim_decision(existing: Option<&str>) -> ClaimDecision {
    match existing {
        None => ClaimDecision::Process,
        Some(RECEIPT_FAILED) => ClaimDecision::Reprocess,
        Some(_) => ClaimDecision::Duplicate,
    }
}

/// One delivery at a time: verify, claim the event id, apply, record the
/// receipt. Deliveries for distinct event ids run concurrently; the intent
/// row lock serializes events touching the same payment.
#[derive(Clone)]
pub struct WebhookProcessor {
    pub receipts: WebhookReceiptsRepo,
    pub providers: ProviderSet,
    pub ledger: PaymentIntentLedger,
}

impl WebhookProcessor {
    pub async fn handle(
        &self,
        provider: PaymentProvider,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, PaymentError> {
        let gateway = self.providers.get(provider);
        let event = gateway.verify_webhook(payload, signature)?;

        let existing = self.receipts.claim(provider, &event.event_id).await?;
        match claim_decision(existing.as_deref()) {
            ClaimDecision::Process => {}
            ClaimDecision::Reprocess => {
                self.receipts
                    .mark(provider, &event.event_id, RECEIPT_PROCESSING)
                    .await?;
            }
            ClaimDecision::Duplicate => {
                self.receipts
                    .mark(provider, &event.event_id, RECEIPT_DUPLICATE)
                    .await?;
                tracing::info!(
                    provider = %provider,
                    event_id = %event.event_id,
                    "duplicate webhook delivery"
                );
                return Ok(WebhookOutcome {
                    received: true,
                    duplicate: true,
                });
            }
        }

        match self.apply(provider, &event).await {
            Ok(()) => {
                self.receipts
                    .mark(provider, &event.event_id, RECEIPT_PROCESSED)
                    .await?;
                Ok(WebhookOutcome {
                    received: true,
                    duplicate: false,
                })
            }
            // Unknown intent or an already-advanced state: acknowledged so
            // the provider stops redelivering, nothing to apply.
            Err(PaymentError::NotFound(msg)) | Err(PaymentError::Conflict(msg)) => {
                tracing::warn!(
                    provider = %provider,
                    event_id = %event.event_id,
                    "webhook acknowledged without side effects: {msg}"
                );
                self.receipts
                    .mark(provider, &event.event_id, RECEIPT_PROCESSED)
                    .await?;
                Ok(WebhookOutcome {
                    received: true,
                    duplicate: false,
                })
            }
            Err(err) => {
                self.receipts
                    .mark(provider, &event.event_id, RECEIPT_FAILED)
                    .await?;
                Err(err)
            }
        }
    }

    async fn apply(
        &self,
        provider: PaymentProvider,
        event: &ProviderEvent,
    ) -> Result<(), PaymentError> {
        if event.kind == ProviderEventKind::Ignored {
            return Ok(());
        }
        let Some(provider_ref) = event.provider_ref.as_deref() else {
            tracing::warn!(
                provider = %provider,
                event_id = %event.event_id,
                "webhook event carries no provider reference"
            );
            return Ok(());
        };
        let key = IntentKey::ProviderRef(provider, provider_ref);

        match event.kind {
            ProviderEventKind::PaymentSucceeded => {
                self.ledger.record_success(key, None, None).await?;
            }
            ProviderEventKind::PaymentFailed => {
                self.ledger
                    .record_failure(
                        key,
                        event.failure_code.as_deref(),
                        event.failure_message.as_deref(),
                    )
                    .await?;
            }
            ProviderEventKind::PaymentCanceled => {
                self.ledger.record_cancellation(key).await?;
            }
            ProviderEventKind::Refunded => {
                self.ledger
                    .record_provider_refund(key, event.amount_minor, Some(&event.event_id))
                    .await?;
            }
            ProviderEventKind::Ignored => unreachable!(),
        }
        Ok(())
    }
}
