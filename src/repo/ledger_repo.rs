use crate::domain::ledger::{LedgerEntryType, PaymentLedgerEntry};
use anyhow::{anyhow, Result};
use sqlx::{PgPool, Postgres, Row, Transaction};

#[derive(Clone)]
pub struct LedgerRepo {
    pub pool: PgPool,
}

impl LedgerRepo {
    /// Append-only: entries are never updated or deleted.
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        intent_id: i64,
        entry_type: LedgerEntryType,
        amount: i64,
        provider_ref: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_ledger_entries (intent_id, entry_type, amount, provider_ref)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(intent_id)
        .bind(entry_type.as_str())
        .bind(amount)
        .bind(provider_ref)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn list_for_intent(&self, intent_id: i64) -> Result<Vec<PaymentLedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, intent_id, entry_type, amount, provider_ref, created_at
            FROM payment_ledger_entries
            WHERE intent_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(intent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let entry_type: String = row.get("entry_type");
                Ok(PaymentLedgerEntry {
                    id: row.get("id"),
                    intent_id: row.get("intent_id"),
                    entry_type: LedgerEntryType::parse(&entry_type)
                        .ok_or_else(|| anyhow!("unknown ledger entry type {entry_type}"))?,
                    amount: row.get("amount"),
                    provider_ref: row.get("provider_ref"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    /// Running total for reconciliation against the intent's amount fields.
    pub async fn sum_for_intent(&self, intent_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS total FROM payment_ledger_entries WHERE intent_id = $1",
        )
        .bind(intent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }
}
