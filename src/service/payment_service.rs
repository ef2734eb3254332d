use crate::domain::error::PaymentError;
use crate::domain::intent::{
    CreatePaymentIntentRequest, CreatePaymentIntentResponse, IntentStatus, PaymentIntent,
    TotalsView,
};
use crate::providers::executor::GatewayExecutor;
use crate::providers::{ChargeRequest, ProviderSet};
use crate::repo::intents_repo::{IntentsRepo, NewPaymentIntent};
use crate::service::collaborators::{MonetizationSettings, TaxRegionResolver};
use crate::service::coupon_guard::CouponRedemptionGuard;
use crate::service::intent_ledger::PaymentIntentLedger;
use crate::totals::calculator::compute_totals;
use crate::totals::types::{DiscountSpec, LineItem};
use std::sync::Arc;
use uuid::Uuid;

/// Checkout entry points: price the order, open the charge upstream, persist
/// the intent, and settle captures through the intent ledger.
#[derive(Clone)]
pub struct PaymentService {
    pub intents_repo: IntentsRepo,
    pub coupon_guard: CouponRedemptionGuard,
    pub tax_resolver: Arc<dyn TaxRegionResolver>,
    pub monetization: Arc<dyn MonetizationSettings>,
    pub providers: ProviderSet,
    pub executor: GatewayExecutor,
    pub ledger: PaymentIntentLedger,
}

impl PaymentService {
    pub async fn create_payment_intent(
        &self,
        req: CreatePaymentIntentRequest,
    ) -> Result<CreatePaymentIntentResponse, PaymentError> {
        let currency = normalize_currency(&req.currency)?;

        let coupon = match req.coupon_code.as_deref() {
            Some(code) => Some(self.coupon_guard.preview(code, req.user_id).await?),
            None => None,
        };
        let discount = coupon.as_ref().map(|c| DiscountSpec {
            kind: c.discount_type,
            value: c.discount_value,
            currency: c.currency.clone(),
        });

        let tax_rate = req
            .country
            .as_deref()
            .and_then(|country| self.tax_resolver.resolve(country, req.region.as_deref()));

        let items: Vec<LineItem> = req
            .line_items
            .iter()
            .map(|i| LineItem {
                unit_amount: i.unit_amount,
                quantity: i.quantity,
                tax_exempt: i.tax_exempt,
            })
            .collect();
        let totals = compute_totals(&items, discount.as_ref(), tax_rate.as_ref(), &currency)?;

        let public_id = format!("pay_{}", Uuid::new_v4().simple());
        let metadata = annotate_metadata(req.metadata, totals.total, self.monetization.as_ref());

        let gateway = self.providers.get(req.provider);
        let charge_req = ChargeRequest {
            amount_minor: totals.total,
            currency: currency.clone(),
            reference: public_id.clone(),
            receipt_email: req.receipt_email.clone(),
        };
        let charge = self
            .executor
            .execute(req.provider, "create_payment", || {
                let gateway = gateway.clone();
                let charge_req = charge_req.clone();
                async move { gateway.create_payment(&charge_req).await }
            })
            .await?;

        let intent = self
            .intents_repo
            .insert(&NewPaymentIntent {
                public_id,
                provider: req.provider,
                provider_intent_ref: Some(charge.provider_ref),
                status: charge.status,
                currency,
                amount_subtotal: totals.subtotal,
                amount_discount: totals.discount,
                amount_tax: totals.tax,
                amount_total: totals.total,
                tax: totals.tax_summary.clone(),
                metadata,
                coupon_id: coupon.as_ref().map(|c| c.id),
                user_id: req.user_id,
                entity_type: req.entity_type,
                entity_id: req.entity_id,
                receipt_email: req.receipt_email,
            })
            .await?;

        tracing::info!(
            payment_id = %intent.public_id,
            provider = %intent.provider,
            amount_total = intent.amount_total,
            "payment intent created"
        );

        Ok(CreatePaymentIntentResponse {
            provider: intent.provider,
            payment_id: intent.public_id,
            client_artifact: charge.client_artifact,
            status: intent.status,
            totals: TotalsView {
                subtotal: totals.subtotal,
                discount: totals.discount,
                tax: totals.tax,
                total: totals.total,
            },
        })
    }

    /// Captures the upstream charge, then records the outcome. The intent row
    /// stays locked across the provider call, so concurrent captures of the
    /// same intent serialize; the loser re-checks the state and conflicts
    /// without reaching the provider a second time.
    pub async fn capture_order(&self, payment_id: &str) -> Result<PaymentIntent, PaymentError> {
        let mut tx = self.intents_repo.pool.begin().await?;
        let mut intent = IntentsRepo::lock_by_public_id_tx(&mut tx, payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(format!("payment intent {payment_id}")))?;

        let provider_ref = capture_precondition(&intent)?;

        let gateway = self.providers.get(intent.provider);
        let outcome = self
            .executor
            .execute(intent.provider, "capture_payment", || {
                let gateway = gateway.clone();
                let provider_ref = provider_ref.clone();
                async move { gateway.capture_payment(&provider_ref).await }
            })
            .await;
        let charge = match outcome {
            Ok(charge) => charge,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        match charge.status {
            IntentStatus::Succeeded => {
                self.ledger
                    .apply_success_tx(&mut tx, &mut intent, Some(&charge.provider_ref), None)
                    .await?;
                tx.commit().await?;
                self.ledger.hooks.on_payment_succeeded(&intent);
                Ok(intent)
            }
            IntentStatus::Failed => {
                self.ledger
                    .apply_failure_tx(
                        &mut tx,
                        &mut intent,
                        charge.failure_code.as_deref(),
                        charge.failure_message.as_deref(),
                    )
                    .await?;
                tx.commit().await?;
                self.ledger.hooks.on_payment_failed(&intent);
                Ok(intent)
            }
            IntentStatus::Canceled => {
                self.ledger.apply_cancellation_tx(&mut tx, &mut intent).await?;
                tx.commit().await?;
                Ok(intent)
            }
            // Still settling upstream; the webhook will finish the job.
            _ => {
                tx.rollback().await?;
                tracing::info!(
                    payment_id,
                    upstream_status = %charge.status,
                    "capture accepted, awaiting provider confirmation"
                );
                Ok(intent)
            }
        }
    }
}

/// Pre-flight check run while the intent row is locked: the capture may only
/// proceed from a state that can still reach success, and needs the upstream
/// reference handed back at creation.
pub fn capture_precondition(intent: &PaymentIntent) -> Result<String, PaymentError> {
    if !crate::domain::transitions::can_transition(intent.status, IntentStatus::Succeeded) {
        return Err(PaymentError::conflict(format!(
            "cannot capture payment in status {}",
            intent.status
        )));
    }
    intent.provider_intent_ref.clone().ok_or_else(|| {
        PaymentError::conflict("payment intent has no provider reference to capture")
    })
}

fn normalize_currency(currency: &str) -> Result<String, PaymentError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PaymentError::validation(format!(
            "invalid currency code {currency:?}"
        )));
    }
    Ok(currency.to_ascii_uppercase())
}

/// Folds the platform commission into the intent metadata. Read-only settings,
/// recorded for downstream payout accounting.
fn annotate_metadata(
    metadata: serde_json::Value,
    amount_total: i64,
    monetization: &dyn MonetizationSettings,
) -> serde_json::Value {
    let commission = ((amount_total as i128 * monetization.commission_bps() as i128) / 10_000)
        .max(monetization.minimum_fee() as i128) as i64;

    let mut metadata = match metadata {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("context".to_string(), other);
            map
        }
    };
    metadata.insert(
        "commission".to_string(),
        serde_json::json!({
            "basis_points": monetization.commission_bps(),
            "minimum_fee": monetization.minimum_fee(),
            "amount": commission,
        }),
    );
    serde_json::Value::Object(metadata)
}
