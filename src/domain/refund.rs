use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Succeeded => "succeeded",
            RefundStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RefundStatus::Pending),
            "succeeded" => Some(RefundStatus::Succeeded),
            "failed" => Some(RefundStatus::Failed),
            _ => None,
        }
    }
}

/// One row per refund attempt. Provider refund id and failure details are
/// stored encrypted; `details_hash` is a deterministic digest of the provider
/// refund id so rows can be located without decryption.
#[derive(Debug, Clone)]
pub struct PaymentRefund {
    pub id: i64,
    pub intent_id: i64,
    pub public_id: String,
    pub amount: i64,
    pub status: RefundStatus,
    pub reason: Option<String>,
    pub details_enc: Option<Vec<u8>>,
    pub details_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sensitive payload encrypted into `details_enc`.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct RefundDetails {
    pub provider_refund_id: Option<String>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}
