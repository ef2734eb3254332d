use crate::domain::coupon::{CouponStatus, DiscountType, PaymentCoupon};
use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

#[derive(Clone)]
pub struct CouponsRepo {
    pub pool: PgPool,
}

const COUPON_COLUMNS: &str = r#"
    id, code, discount_type, discount_value, currency, valid_from, valid_until,
    max_redemptions, per_user_limit, times_redeemed, status
"#;

fn coupon_from_row(row: &PgRow) -> Result<PaymentCoupon> {
    let discount_type: String = row.get("discount_type");
    let status: String = row.get("status");
    Ok(PaymentCoupon {
        id: row.get("id"),
        code: row.get("code"),
        discount_type: DiscountType::parse(&discount_type)
            .ok_or_else(|| anyhow!("unknown discount type {discount_type}"))?,
        discount_value: row.get("discount_value"),
        currency: row.get("currency"),
        valid_from: row.get("valid_from"),
        valid_until: row.get("valid_until"),
        max_redemptions: row.get("max_redemptions"),
        per_user_limit: row.get("per_user_limit"),
        times_redeemed: row.get("times_redeemed"),
        status: CouponStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown coupon status {status}"))?,
    })
}

impl CouponsRepo {
    pub async fn find_by_code(&self, code: &str) -> Result<Option<PaymentCoupon>> {
        let row = sqlx::query(&format!(
            "SELECT {COUPON_COLUMNS} FROM payment_coupons WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(coupon_from_row).transpose()
    }

    pub async fn lock_by_id_tx(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
    ) -> Result<Option<PaymentCoupon>> {
        let row = sqlx::query(&format!(
            "SELECT {COUPON_COLUMNS} FROM payment_coupons WHERE id = $1 FOR UPDATE"
        ))
        .bind(coupon_id)
        .fetch_optional(tx.as_mut())
        .await?;

        row.as_ref().map(coupon_from_row).transpose()
    }

    pub async fn count_redemptions_for_user(&self, coupon_id: i64, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS used FROM coupon_redemptions WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("used"))
    }

    pub async fn count_redemptions_for_user_tx(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
        user_id: i64,
    ) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS used FROM coupon_redemptions WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(tx.as_mut())
        .await?;

        Ok(row.get("used"))
    }

    pub async fn insert_redemption_tx(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
        user_id: i64,
        intent_id: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO coupon_redemptions (coupon_id, user_id, intent_id) VALUES ($1, $2, $3)",
        )
        .bind(coupon_id)
        .bind(user_id)
        .bind(intent_id)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn increment_times_redeemed_tx(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE payment_coupons SET times_redeemed = times_redeemed + 1, updated_at = now() WHERE id = $1",
        )
        .bind(coupon_id)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }
}
