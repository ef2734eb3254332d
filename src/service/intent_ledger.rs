use crate::domain::error::PaymentError;
use crate::domain::events::{
    PaymentEventPayload, PAYMENT_CANCELED, PAYMENT_FAILED, PAYMENT_REFUNDED, PAYMENT_SUCCEEDED,
};
use crate::domain::intent::{IntentStatus, PaymentIntent, PaymentProvider};
use crate::domain::ledger::LedgerEntryType;
use crate::domain::transitions::{can_transition, refund_status};
use crate::repo::intents_repo::IntentsRepo;
use crate::repo::ledger_repo::LedgerRepo;
use crate::repo::outbox_repo::OutboxRepo;
use crate::service::collaborators::SubscriptionHooks;
use crate::service::coupon_guard::CouponRedemptionGuard;
use anyhow::anyhow;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

/// How a settlement event identifies its intent. Capture calls know the
/// public id; webhook deliveries only carry the provider's reference.
#[derive(Debug, Clone, Copy)]
pub enum IntentKey<'a> {
    PublicId(&'a str),
    ProviderRef(PaymentProvider, &'a str),
}

impl IntentKey<'_> {
    async fn lock(&self, tx: &mut Transaction<'_, Postgres>) -> Result<PaymentIntent, PaymentError> {
        let found = match self {
            IntentKey::PublicId(public_id) => {
                IntentsRepo::lock_by_public_id_tx(tx, public_id).await?
            }
            IntentKey::ProviderRef(provider, provider_ref) => {
                IntentsRepo::lock_by_provider_ref_tx(tx, *provider, provider_ref).await?
            }
        };
        found.ok_or_else(|| PaymentError::not_found(format!("payment intent for {self:?}")))
    }
}

/// Single writer for settlement state. Every transition goes through one
/// transaction that locks the intent row, validates the transition, appends
/// the ledger entry and enqueues the outbox event together.
#[derive(Clone)]
pub struct PaymentIntentLedger {
    pub pool: PgPool,
    pub coupon_guard: CouponRedemptionGuard,
    pub hooks: Arc<dyn SubscriptionHooks>,
}

impl PaymentIntentLedger {
    pub async fn record_success(
        &self,
        key: IntentKey<'_>,
        capture_ref: Option<&str>,
        charge_ref: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let mut intent = key.lock(&mut tx).await?;
        self.apply_success_tx(&mut tx, &mut intent, capture_ref, charge_ref)
            .await?;
        tx.commit().await?;

        self.hooks.on_payment_succeeded(&intent);
        Ok(intent)
    }

    /// Settles a success inside a caller-held transaction that already locks
    /// the intent row. The caller commits and fires the hook.
    pub async fn apply_success_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        intent: &mut PaymentIntent,
        capture_ref: Option<&str>,
        charge_ref: Option<&str>,
    ) -> Result<(), PaymentError> {
        if !can_transition(intent.status, IntentStatus::Succeeded) {
            return Err(PaymentError::conflict(format!(
                "cannot succeed payment in status {}",
                intent.status
            )));
        }

        let captured_at = Utc::now();
        IntentsRepo::mark_succeeded_tx(tx, intent.id, capture_ref, charge_ref, captured_at)
            .await?;
        intent.status = IntentStatus::Succeeded;
        intent.captured_at = Some(captured_at);
        if capture_ref.is_some() {
            intent.provider_capture_ref = capture_ref.map(str::to_owned);
        }
        if charge_ref.is_some() {
            intent.provider_charge_ref = charge_ref.map(str::to_owned);
        }

        LedgerRepo::insert_tx(
            tx,
            intent.id,
            LedgerEntryType::Charge,
            intent.amount_total,
            intent.provider_charge_ref.as_deref(),
        )
        .await?;

        if let Some(coupon_id) = intent.coupon_id {
            self.coupon_guard
                .finalize_tx(tx, coupon_id, intent.user_id, intent.id)
                .await?;
        }

        self.enqueue(tx, intent, PAYMENT_SUCCEEDED).await
    }

    pub async fn record_failure(
        &self,
        key: IntentKey<'_>,
        failure_code: Option<&str>,
        failure_message: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let mut intent = key.lock(&mut tx).await?;
        self.apply_failure_tx(&mut tx, &mut intent, failure_code, failure_message)
            .await?;
        tx.commit().await?;

        self.hooks.on_payment_failed(&intent);
        Ok(intent)
    }

    pub async fn apply_failure_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        intent: &mut PaymentIntent,
        failure_code: Option<&str>,
        failure_message: Option<&str>,
    ) -> Result<(), PaymentError> {
        if !can_transition(intent.status, IntentStatus::Failed) {
            return Err(PaymentError::conflict(format!(
                "cannot fail payment in status {}",
                intent.status
            )));
        }

        IntentsRepo::mark_failed_tx(tx, intent.id, failure_code, failure_message).await?;
        intent.status = IntentStatus::Failed;
        intent.failure_code = failure_code.map(str::to_owned);
        intent.failure_message = failure_message.map(str::to_owned);

        self.enqueue(tx, intent, PAYMENT_FAILED).await
    }

    pub async fn record_cancellation(
        &self,
        key: IntentKey<'_>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let mut intent = key.lock(&mut tx).await?;
        self.apply_cancellation_tx(&mut tx, &mut intent).await?;
        tx.commit().await?;

        Ok(intent)
    }

    pub async fn apply_cancellation_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        intent: &mut PaymentIntent,
    ) -> Result<(), PaymentError> {
        if !can_transition(intent.status, IntentStatus::Canceled) {
            return Err(PaymentError::conflict(format!(
                "cannot cancel payment in status {}",
                intent.status
            )));
        }

        let canceled_at = Utc::now();
        IntentsRepo::mark_canceled_tx(tx, intent.id, canceled_at).await?;
        intent.status = IntentStatus::Canceled;
        intent.canceled_at = Some(canceled_at);

        self.enqueue(tx, intent, PAYMENT_CANCELED).await
    }

    /// Provider-initiated refund (reported over a webhook, not requested
    /// through this service). `amount` of `None` means the provider refunded
    /// the full remaining balance.
    pub async fn record_provider_refund(
        &self,
        key: IntentKey<'_>,
        amount: Option<i64>,
        provider_ref: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let mut intent = key.lock(&mut tx).await?;

        let remaining = intent.amount_total - intent.amount_refunded;
        let mut amount = amount.unwrap_or(remaining);
        if amount <= 0 {
            return Err(PaymentError::conflict("nothing left to refund"));
        }
        if amount > remaining {
            tracing::warn!(
                payment_id = %intent.public_id,
                amount,
                remaining,
                "provider refund exceeds remaining balance, clamping"
            );
            amount = remaining;
        }

        let refunded = intent.amount_refunded + amount;
        let next = refund_status(intent.amount_total, refunded);
        if !can_transition(intent.status, next) {
            return Err(PaymentError::conflict(format!(
                "cannot refund payment in status {}",
                intent.status
            )));
        }

        IntentsRepo::apply_refund_tx(&mut tx, intent.id, refunded, next).await?;
        intent.status = next;
        intent.amount_refunded = refunded;

        LedgerRepo::insert_tx(&mut tx, intent.id, LedgerEntryType::Refund, -amount, provider_ref)
            .await?;

        self.enqueue(&mut tx, &intent, PAYMENT_REFUNDED).await?;
        tx.commit().await?;

        self.hooks.on_payment_refunded(&intent);
        Ok(intent)
    }

    async fn enqueue(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        intent: &PaymentIntent,
        event_type: &str,
    ) -> Result<(), PaymentError> {
        let payload = serde_json::to_value(PaymentEventPayload::from_intent(intent))
            .map_err(|e| anyhow!(e))?;
        OutboxRepo::insert_tx(tx, &intent.public_id, event_type, payload).await?;
        Ok(())
    }
}
