use crate::domain::intent::PaymentProvider;
use anyhow::Result;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct WebhookReceiptsRepo {
    pub pool: PgPool,
}

impl WebhookReceiptsRepo {
    /// Atomically claims an event id. Returns `None` when this delivery owns
    /// the fresh claim, otherwise the status already recorded for the id.
    pub async fn claim(
        &self,
        provider: PaymentProvider,
        event_id: &str,
    ) -> Result<Option<String>> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO webhook_receipts (provider, event_id, status)
            VALUES ($1, $2, 'processing')
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT status FROM webhook_receipts WHERE provider = $1 AND event_id = $2",
        )
        .bind(provider.as_str())
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(row.get("status")))
    }

    pub async fn mark(
        &self,
        provider: PaymentProvider,
        event_id: &str,
        status: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE webhook_receipts
            SET status = $3, updated_at = now()
            WHERE provider = $1 AND event_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
