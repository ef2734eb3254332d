use crate::domain::coupon::{CouponStatus, PaymentCoupon};
use crate::domain::error::PaymentError;
use crate::repo::coupons_repo::CouponsRepo;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

/// Why a finalization was skipped. The payment has already settled at that
/// point, so none of these abort anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    OutsideWindow,
    PerUserLimitReached,
    GloballyExhausted,
}

/// Non-finalization coupon checks shared by the preview and finalize paths.
pub fn coupon_usable(coupon: &PaymentCoupon, now: DateTime<Utc>) -> Result<(), SkipReason> {
    if coupon.status != CouponStatus::Active {
        return Err(SkipReason::Inactive);
    }
    if coupon.valid_from.is_some_and(|t| now < t) {
        return Err(SkipReason::OutsideWindow);
    }
    if coupon.valid_until.is_some_and(|t| now > t) {
        return Err(SkipReason::OutsideWindow);
    }
    Ok(())
}

/// Finalize-time recheck, applied under the coupon row lock. Catches races
/// the non-locking preview could not see.
pub fn finalize_check(
    coupon: &PaymentCoupon,
    user_redemptions: i64,
    now: DateTime<Utc>,
) -> Result<(), SkipReason> {
    coupon_usable(coupon, now)?;
    if coupon
        .per_user_limit
        .is_some_and(|limit| user_redemptions >= limit as i64)
    {
        return Err(SkipReason::PerUserLimitReached);
    }
    if coupon
        .max_redemptions
        .is_some_and(|max| coupon.times_redeemed >= max)
    {
        return Err(SkipReason::GloballyExhausted);
    }
    Ok(())
}

#[derive(Clone)]
pub struct CouponRedemptionGuard {
    pub coupons_repo: CouponsRepo,
}

impl CouponRedemptionGuard {
    /// Intent-creation-time validation. No lock: the authoritative check
    /// happens again at finalization.
    pub async fn preview(&self, code: &str, user_id: i64) -> Result<PaymentCoupon, PaymentError> {
        let coupon = self
            .coupons_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| PaymentError::not_found(format!("coupon {code}")))?;

        if coupon_usable(&coupon, Utc::now()).is_err() {
            return Err(PaymentError::validation("coupon is not currently redeemable"));
        }

        if let Some(limit) = coupon.per_user_limit {
            let used = self
                .coupons_repo
                .count_redemptions_for_user(coupon.id, user_id)
                .await?;
            if used >= limit as i64 {
                return Err(PaymentError::validation("coupon redemption limit reached"));
            }
        }

        Ok(coupon)
    }

    /// Payment-success finalization, inside the success transaction. Returns
    /// whether a redemption was recorded. A check failing here means a lost
    /// race; the discount stays applied and the payment stays settled, so the
    /// redemption is skipped silently.
    pub async fn finalize_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
        user_id: i64,
        intent_id: i64,
    ) -> Result<bool> {
        let Some(coupon) = CouponsRepo::lock_by_id_tx(tx, coupon_id).await? else {
            tracing::warn!(coupon_id, "coupon vanished before finalization");
            return Ok(false);
        };

        let used = CouponsRepo::count_redemptions_for_user_tx(tx, coupon_id, user_id).await?;
        if let Err(reason) = finalize_check(&coupon, used, Utc::now()) {
            tracing::info!(coupon_id, user_id, ?reason, "skipping coupon finalization");
            return Ok(false);
        }

        CouponsRepo::insert_redemption_tx(tx, coupon_id, user_id, intent_id).await?;
        CouponsRepo::increment_times_redeemed_tx(tx, coupon_id).await?;
        Ok(true)
    }
}
