use crate::crypto::{lookup_hash, SecretCipher};
use crate::domain::error::PaymentError;
use crate::domain::events::{PaymentEventPayload, PAYMENT_REFUNDED};
use crate::domain::intent::{IntentStatus, PaymentIntent};
use crate::domain::ledger::LedgerEntryType;
use crate::domain::refund::{RefundDetails, RefundStatus};
use crate::domain::transitions::refund_status;
use crate::providers::executor::GatewayExecutor;
use crate::providers::{ProviderSet, RefundRequest};
use crate::repo::intents_repo::IntentsRepo;
use crate::repo::ledger_repo::LedgerRepo;
use crate::repo::outbox_repo::OutboxRepo;
use crate::repo::refunds_repo::{NewRefund, RefundsRepo};
use crate::service::collaborators::SubscriptionHooks;
use anyhow::anyhow;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Refundable balance, or why there is none.
pub fn refund_available(intent: &PaymentIntent) -> Result<i64, PaymentError> {
    if !matches!(
        intent.status,
        IntentStatus::Succeeded | IntentStatus::PartiallyRefunded
    ) {
        return Err(PaymentError::conflict(format!(
            "cannot refund payment in status {}",
            intent.status
        )));
    }
    let available = intent.amount_total - intent.amount_refunded;
    if available <= 0 {
        return Err(PaymentError::conflict("nothing left to refund"));
    }
    Ok(available)
}

/// Resolves the requested amount against the available balance. No request
/// means a full refund of whatever remains.
pub fn resolve_amount(requested: Option<i64>, available: i64) -> Result<i64, PaymentError> {
    match requested {
        None => Ok(available),
        Some(amount) if amount <= 0 => {
            Err(PaymentError::validation("refund amount must be a positive integer"))
        }
        Some(amount) if amount > available => Err(PaymentError::validation(format!(
            "refund amount {amount} exceeds available balance {available}"
        ))),
        Some(amount) => Ok(amount),
    }
}

/// Merchant-initiated refunds. The intent row stays locked across the
/// provider call so concurrent refunds of the same intent serialize and the
/// available balance cannot be double-spent.
#[derive(Clone)]
pub struct RefundEngine {
    pub pool: PgPool,
    pub providers: ProviderSet,
    pub executor: GatewayExecutor,
    pub cipher: SecretCipher,
    pub hooks: Arc<dyn SubscriptionHooks>,
}

impl RefundEngine {
    pub async fn issue_refund(
        &self,
        payment_id: &str,
        requested: Option<i64>,
        reason: Option<String>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let mut intent = IntentsRepo::lock_by_public_id_tx(&mut tx, payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(format!("payment intent {payment_id}")))?;

        let available = refund_available(&intent)?;
        let amount = resolve_amount(requested, available)?;

        let provider_ref = intent
            .provider_capture_ref
            .clone()
            .or_else(|| intent.provider_charge_ref.clone())
            .or_else(|| intent.provider_intent_ref.clone())
            .ok_or_else(|| {
                PaymentError::conflict("payment intent has no provider reference to refund")
            })?;

        let gateway = self.providers.get(intent.provider);
        let refund_req = RefundRequest {
            provider_ref,
            amount_minor: amount,
            currency: intent.currency.clone(),
            reason: reason.clone(),
        };
        let outcome = self
            .executor
            .execute(intent.provider, "refund_payment", || {
                let gateway = gateway.clone();
                let refund_req = refund_req.clone();
                async move { gateway.refund_payment(&refund_req).await }
            })
            .await;

        let refund = match outcome {
            Ok(refund) => refund,
            Err(err) => {
                // Release the lock first; the failed attempt is recorded on
                // its own so the audit trail survives the rollback.
                tx.rollback().await?;
                if let PaymentError::Upstream { message, .. } = &err {
                    self.record_failed_attempt(&intent, amount, reason, message)
                        .await?;
                }
                return Err(err);
            }
        };

        if !refund.succeeded {
            let details = RefundDetails {
                provider_refund_id: Some(refund.provider_refund_ref.clone()),
                failure_code: refund.failure_code.clone(),
                failure_message: refund.failure_message.clone(),
            };
            RefundsRepo::insert_tx(
                &mut tx,
                &NewRefund {
                    intent_id: intent.id,
                    public_id: refund_public_id(),
                    amount,
                    status: RefundStatus::Failed,
                    reason,
                    details_enc: Some(self.encrypt_details(&details)?),
                    details_hash: Some(lookup_hash(&refund.provider_refund_ref)),
                },
            )
            .await?;
            tx.commit().await?;
            return Err(PaymentError::Upstream {
                provider: intent.provider,
                operation: "refund_payment".to_string(),
                status: None,
                message: refund
                    .failure_message
                    .unwrap_or_else(|| "refund declined by provider".to_string()),
            });
        }

        let refunded = intent.amount_refunded + amount;
        let next = refund_status(intent.amount_total, refunded);

        IntentsRepo::apply_refund_tx(&mut tx, intent.id, refunded, next).await?;
        intent.status = next;
        intent.amount_refunded = refunded;

        let details = RefundDetails {
            provider_refund_id: Some(refund.provider_refund_ref.clone()),
            failure_code: None,
            failure_message: None,
        };
        RefundsRepo::insert_tx(
            &mut tx,
            &NewRefund {
                intent_id: intent.id,
                public_id: refund_public_id(),
                amount,
                status: RefundStatus::Succeeded,
                reason,
                details_enc: Some(self.encrypt_details(&details)?),
                details_hash: Some(lookup_hash(&refund.provider_refund_ref)),
            },
        )
        .await?;

        LedgerRepo::insert_tx(
            &mut tx,
            intent.id,
            LedgerEntryType::Refund,
            -amount,
            Some(&refund.provider_refund_ref),
        )
        .await?;

        let payload = serde_json::to_value(PaymentEventPayload::from_intent(&intent))
            .map_err(|e| anyhow!(e))?;
        OutboxRepo::insert_tx(&mut tx, &intent.public_id, PAYMENT_REFUNDED, payload).await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %intent.public_id,
            amount,
            amount_refunded = intent.amount_refunded,
            status = %intent.status,
            "refund issued"
        );
        self.hooks.on_payment_refunded(&intent);
        Ok(intent)
    }

    async fn record_failed_attempt(
        &self,
        intent: &PaymentIntent,
        amount: i64,
        reason: Option<String>,
        failure_message: &str,
    ) -> Result<(), PaymentError> {
        let details = RefundDetails {
            provider_refund_id: None,
            failure_code: None,
            failure_message: Some(failure_message.to_string()),
        };
        let mut tx = self.pool.begin().await?;
        RefundsRepo::insert_tx(
            &mut tx,
            &NewRefund {
                intent_id: intent.id,
                public_id: refund_public_id(),
                amount,
                status: RefundStatus::Failed,
                reason,
                details_enc: Some(self.encrypt_details(&details)?),
                details_hash: None,
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    fn encrypt_details(&self, details: &RefundDetails) -> Result<Vec<u8>, PaymentError> {
        let plaintext = serde_json::to_vec(details).map_err(|e| anyhow!(e))?;
        Ok(self.cipher.encrypt(&plaintext)?)
    }
}

fn refund_public_id() -> String {
    format!("re_{}", Uuid::new_v4().simple())
}
