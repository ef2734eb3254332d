use crate::domain::intent::{IntentStatus, PaymentIntent, PaymentProvider, TaxSummary};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

pub struct NewPaymentIntent {
    pub public_id: String,
    pub provider: PaymentProvider,
    pub provider_intent_ref: Option<String>,
    pub status: IntentStatus,
    pub currency: String,
    pub amount_subtotal: i64,
    pub amount_discount: i64,
    pub amount_tax: i64,
    pub amount_total: i64,
    pub tax: Option<TaxSummary>,
    pub metadata: serde_json::Value,
    pub coupon_id: Option<i64>,
    pub user_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub receipt_email: Option<String>,
}

#[derive(Clone)]
pub struct IntentsRepo {
    pub pool: PgPool,
}

const INTENT_COLUMNS: &str = r#"
    id, public_id, provider, provider_intent_ref, provider_capture_ref, provider_charge_ref,
    status, currency, amount_subtotal, amount_discount, amount_tax, amount_total, amount_refunded,
    tax_jurisdiction, tax_rate, tax_inclusive, taxable_amount, metadata, coupon_id,
    user_id, entity_type, entity_id, receipt_email, captured_at, canceled_at,
    failure_code, failure_message, created_at
"#;

fn intent_from_row(row: &PgRow) -> Result<PaymentIntent> {
    let provider: String = row.get("provider");
    let status: String = row.get("status");
    let tax_jurisdiction: Option<String> = row.get("tax_jurisdiction");

    let tax = tax_jurisdiction.map(|jurisdiction| TaxSummary {
        jurisdiction,
        rate: row.get("tax_rate"),
        inclusive: row.get("tax_inclusive"),
        taxable_amount: row.get("taxable_amount"),
    });

    Ok(PaymentIntent {
        id: row.get("id"),
        public_id: row.get("public_id"),
        provider: PaymentProvider::parse(&provider)
            .ok_or_else(|| anyhow!("unknown provider {provider}"))?,
        provider_intent_ref: row.get("provider_intent_ref"),
        provider_capture_ref: row.get("provider_capture_ref"),
        provider_charge_ref: row.get("provider_charge_ref"),
        status: IntentStatus::parse(&status).ok_or_else(|| anyhow!("unknown status {status}"))?,
        currency: row.get("currency"),
        amount_subtotal: row.get("amount_subtotal"),
        amount_discount: row.get("amount_discount"),
        amount_tax: row.get("amount_tax"),
        amount_total: row.get("amount_total"),
        amount_refunded: row.get("amount_refunded"),
        tax,
        metadata: row.get("metadata"),
        coupon_id: row.get("coupon_id"),
        user_id: row.get("user_id"),
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        receipt_email: row.get("receipt_email"),
        captured_at: row.get("captured_at"),
        canceled_at: row.get("canceled_at"),
        failure_code: row.get("failure_code"),
        failure_message: row.get("failure_message"),
        created_at: row.get("created_at"),
    })
}

impl IntentsRepo {
    pub async fn insert(&self, data: &NewPaymentIntent) -> Result<PaymentIntent> {
        let (jurisdiction, rate, inclusive, taxable) = match &data.tax {
            Some(t) => (
                Some(t.jurisdiction.clone()),
                Some(t.rate),
                t.inclusive,
                t.taxable_amount,
            ),
            None => (None, None, false, 0),
        };

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_intents (
                public_id, provider, provider_intent_ref, status, currency,
                amount_subtotal, amount_discount, amount_tax, amount_total, amount_refunded,
                tax_jurisdiction, tax_rate, tax_inclusive, taxable_amount, metadata,
                coupon_id, user_id, entity_type, entity_id, receipt_email
            ) VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, 0,
                $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19
            )
            RETURNING {INTENT_COLUMNS}
            "#
        ))
        .bind(&data.public_id)
        .bind(data.provider.as_str())
        .bind(&data.provider_intent_ref)
        .bind(data.status.as_str())
        .bind(&data.currency)
        .bind(data.amount_subtotal)
        .bind(data.amount_discount)
        .bind(data.amount_tax)
        .bind(data.amount_total)
        .bind(jurisdiction)
        .bind(rate)
        .bind(inclusive)
        .bind(taxable)
        .bind(&data.metadata)
        .bind(data.coupon_id)
        .bind(data.user_id)
        .bind(&data.entity_type)
        .bind(data.entity_id)
        .bind(&data.receipt_email)
        .fetch_one(&self.pool)
        .await?;

        intent_from_row(&row)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> Result<Option<PaymentIntent>> {
        let row = sqlx::query(&format!(
            "SELECT {INTENT_COLUMNS} FROM payment_intents WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(intent_from_row).transpose()
    }

    pub async fn lock_by_public_id_tx(
        tx: &mut Transaction<'_, Postgres>,
        public_id: &str,
    ) -> Result<Option<PaymentIntent>> {
        let row = sqlx::query(&format!(
            "SELECT {INTENT_COLUMNS} FROM payment_intents WHERE public_id = $1 FOR UPDATE"
        ))
        .bind(public_id)
        .fetch_optional(tx.as_mut())
        .await?;

        row.as_ref().map(intent_from_row).transpose()
    }

    pub async fn lock_by_provider_ref_tx(
        tx: &mut Transaction<'_, Postgres>,
        provider: PaymentProvider,
        provider_ref: &str,
    ) -> Result<Option<PaymentIntent>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {INTENT_COLUMNS} FROM payment_intents
            WHERE provider = $1
              AND (provider_intent_ref = $2 OR provider_capture_ref = $2 OR provider_charge_ref = $2)
            FOR UPDATE
            "#
        ))
        .bind(provider.as_str())
        .bind(provider_ref)
        .fetch_optional(tx.as_mut())
        .await?;

        row.as_ref().map(intent_from_row).transpose()
    }

    pub async fn mark_succeeded_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        capture_ref: Option<&str>,
        charge_ref: Option<&str>,
        captured_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_intents
            SET status = 'succeeded',
                provider_capture_ref = COALESCE($2, provider_capture_ref),
                provider_charge_ref = COALESCE($3, provider_charge_ref),
                captured_at = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(capture_ref)
        .bind(charge_ref)
        .bind(captured_at)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn mark_failed_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        failure_code: Option<&str>,
        failure_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_intents
            SET status = 'failed', failure_code = $2, failure_message = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(failure_code)
        .bind(failure_message)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn mark_canceled_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        canceled_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_intents
            SET status = 'canceled', canceled_at = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(canceled_at)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn apply_refund_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        amount_refunded: i64,
        status: IntentStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_intents
            SET amount_refunded = $2, status = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(amount_refunded)
        .bind(status.as_str())
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }
}
