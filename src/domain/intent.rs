use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Card,
    Wallet,
    Escrow,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Card => "card",
            PaymentProvider::Wallet => "wallet",
            PaymentProvider::Escrow => "escrow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentProvider::Card),
            "wallet" => Some(PaymentProvider::Wallet),
            "escrow" => Some(PaymentProvider::Escrow),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    PartiallyRefunded,
    Refunded,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Failed => "failed",
            IntentStatus::Canceled => "canceled",
            IntentStatus::PartiallyRefunded => "partially_refunded",
            IntentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requires_payment_method" => Some(IntentStatus::RequiresPaymentMethod),
            "requires_action" => Some(IntentStatus::RequiresAction),
            "processing" => Some(IntentStatus::Processing),
            "succeeded" => Some(IntentStatus::Succeeded),
            "failed" => Some(IntentStatus::Failed),
            "canceled" => Some(IntentStatus::Canceled),
            "partially_refunded" => Some(IntentStatus::PartiallyRefunded),
            "refunded" => Some(IntentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured tax breakdown persisted alongside the intent amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxSummary {
    pub jurisdiction: String,
    pub rate: f64,
    pub inclusive: bool,
    pub taxable_amount: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: i64,
    pub public_id: String,
    pub provider: PaymentProvider,
    pub provider_intent_ref: Option<String>,
    pub provider_capture_ref: Option<String>,
    pub provider_charge_ref: Option<String>,
    pub status: IntentStatus,
    pub currency: String,
    pub amount_subtotal: i64,
    pub amount_discount: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub amount_refunded: i64,
    pub tax: Option<TaxSummary>,
    pub metadata: serde_json::Value,
    pub coupon_id: Option<i64>,
    pub user_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub receipt_email: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub unit_amount: i64,
    pub quantity: i64,
    #[serde(default)]
    pub tax_exempt: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub provider: PaymentProvider,
    pub currency: String,
    pub line_items: Vec<LineItemInput>,
    pub coupon_code: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub user_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentIntentResponse {
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub client_artifact: Option<String>,
    pub status: IntentStatus,
    pub totals: TotalsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentView {
    pub payment_id: String,
    pub provider: PaymentProvider,
    pub status: IntentStatus,
    pub currency: String,
    pub amount_subtotal: i64,
    pub amount_discount: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub amount_refunded: i64,
    pub coupon_id: Option<i64>,
    pub entity_type: String,
    pub entity_id: i64,
    pub captured_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

impl From<&PaymentIntent> for IntentView {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            payment_id: intent.public_id.clone(),
            provider: intent.provider,
            status: intent.status,
            currency: intent.currency.clone(),
            amount_subtotal: intent.amount_subtotal,
            amount_discount: intent.amount_discount,
            amount_tax: intent.amount_tax,
            amount_total: intent.amount_total,
            amount_refunded: intent.amount_refunded,
            coupon_id: intent.coupon_id,
            entity_type: intent.entity_type.clone(),
            entity_id: intent.entity_id,
            captured_at: intent.captured_at,
            canceled_at: intent.canceled_at,
            failure_code: intent.failure_code.clone(),
            failure_message: intent.failure_message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
