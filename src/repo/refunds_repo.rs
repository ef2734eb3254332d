use crate::domain::refund::{PaymentRefund, RefundStatus};
use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

pub struct NewRefund {
    pub intent_id: i64,
    pub public_id: String,
    pub amount: i64,
    pub status: RefundStatus,
    pub reason: Option<String>,
    pub details_enc: Option<Vec<u8>>,
    pub details_hash: Option<String>,
}

#[derive(Clone)]
pub struct RefundsRepo {
    pub pool: PgPool,
}

fn refund_from_row(row: &PgRow) -> Result<PaymentRefund> {
    let status: String = row.get("status");
    Ok(PaymentRefund {
        id: row.get("id"),
        intent_id: row.get("intent_id"),
        public_id: row.get("public_id"),
        amount: row.get("amount"),
        status: RefundStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown refund status {status}"))?,
        reason: row.get("reason"),
        details_enc: row.get("details_enc"),
        details_hash: row.get("details_hash"),
        created_at: row.get("created_at"),
    })
}

impl RefundsRepo {
    pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, data: &NewRefund) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO payment_refunds (intent_id, public_id, amount, status, reason, details_enc, details_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(data.intent_id)
        .bind(&data.public_id)
        .bind(data.amount)
        .bind(data.status.as_str())
        .bind(&data.reason)
        .bind(&data.details_enc)
        .bind(&data.details_hash)
        .fetch_one(tx.as_mut())
        .await?;

        Ok(row.get("id"))
    }

    pub async fn list_for_intent(&self, intent_id: i64) -> Result<Vec<PaymentRefund>> {
        let rows = sqlx::query(
            r#"
            SELECT id, intent_id, public_id, amount, status, reason, details_enc, details_hash, created_at
            FROM payment_refunds
            WHERE intent_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(intent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(refund_from_row).collect()
    }
}
