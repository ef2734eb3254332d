use crate::domain::intent::PaymentIntent;
use crate::totals::types::TaxRate;

/// Pure tax lookup. The jurisdiction rule tables live outside this crate.
pub trait TaxRegionResolver: Send + Sync {
    fn resolve(&self, country: &str, region: Option<&str>) -> Option<TaxRate>;
}

/// Static table used in development and tests.
pub struct StaticTaxResolver {
    pub entries: Vec<(String, Option<String>, TaxRate)>,
}

impl TaxRegionResolver for StaticTaxResolver {
    fn resolve(&self, country: &str, region: Option<&str>) -> Option<TaxRate> {
        self.entries
            .iter()
            .filter(|(c, r, _)| {
                c.eq_ignore_ascii_case(country)
                    && match (r, region) {
                        (Some(want), Some(got)) => want.eq_ignore_ascii_case(got),
                        (None, _) => true,
                        (Some(_), None) => false,
                    }
            })
            // prefer the most specific match
            .max_by_key(|(_, r, _)| r.is_some())
            .map(|(_, _, rate)| rate.clone())
    }
}

/// Commission/monetization settings, consumed read-only when annotating
/// intent metadata.
pub trait MonetizationSettings: Send + Sync {
    fn commission_bps(&self) -> i64;
    fn minimum_fee(&self) -> i64;
}

pub struct FixedMonetizationSettings {
    pub commission_bps: i64,
    pub minimum_fee: i64,
}

impl MonetizationSettings for FixedMonetizationSettings {
    fn commission_bps(&self) -> i64 {
        self.commission_bps
    }

    fn minimum_fee(&self) -> i64 {
        self.minimum_fee
    }
}

/// Subscription-lifecycle hooks, invoked after the local transaction commits.
/// Hook failures must not affect already-committed state.
pub trait SubscriptionHooks: Send + Sync {
    fn on_payment_succeeded(&self, intent: &PaymentIntent);
    fn on_payment_failed(&self, intent: &PaymentIntent);
    fn on_payment_refunded(&self, intent: &PaymentIntent);
}

/// Default hooks: log and move on.
pub struct LoggingHooks;

impl SubscriptionHooks for LoggingHooks {
    fn on_payment_succeeded(&self, intent: &PaymentIntent) {
        tracing::info!(payment_id = %intent.public_id, "payment succeeded");
    }

    fn on_payment_failed(&self, intent: &PaymentIntent) {
        tracing::info!(payment_id = %intent.public_id, "payment failed");
    }

    fn on_payment_refunded(&self, intent: &PaymentIntent) {
        tracing::info!(
            payment_id = %intent.public_id,
            amount_refunded = intent.amount_refunded,
            "payment refunded"
        );
    }
}
