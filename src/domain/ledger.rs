use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntryType {
    Charge,
    Refund,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Charge => "charge",
            LedgerEntryType::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "charge" => Some(LedgerEntryType::Charge),
            "refund" => Some(LedgerEntryType::Refund),
            _ => None,
        }
    }
}

/// Append-only. Charges are positive, refunds negative; the running sum for
/// an intent must equal `amount_total - amount_refunded` once captured.
#[derive(Debug, Clone)]
pub struct PaymentLedgerEntry {
    pub id: i64,
    pub intent_id: i64,
    pub entry_type: LedgerEntryType,
    pub amount: i64,
    pub provider_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}
