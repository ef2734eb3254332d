use crate::domain::intent::{IntentStatus, PaymentIntent, PaymentProvider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";
pub const PAYMENT_FAILED: &str = "payment.failed";
pub const PAYMENT_CANCELED: &str = "payment.canceled";
pub const PAYMENT_REFUNDED: &str = "payment.refunded";

pub const EVENT_SOURCE: &str = "payments-core";

/// Payload published on the domain event stream. Consumers are external
/// subsystems (subscription lifecycle, notifications).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventPayload {
    pub payment_id: String,
    pub provider: PaymentProvider,
    pub status: IntentStatus,
    pub currency: String,
    pub amount_total: i64,
    pub amount_refunded: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub source: String,
    pub correlation_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl PaymentEventPayload {
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        Self {
            payment_id: intent.public_id.clone(),
            provider: intent.provider,
            status: intent.status,
            currency: intent.currency.clone(),
            amount_total: intent.amount_total,
            amount_refunded: intent.amount_refunded,
            entity_type: intent.entity_type.clone(),
            entity_id: intent.entity_id,
            source: EVENT_SOURCE.to_string(),
            correlation_id: intent.public_id.clone(),
            occurred_at: Utc::now(),
        }
    }
}
