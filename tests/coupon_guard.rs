use chrono::{Duration, Utc};
use learnpay::domain::coupon::{CouponStatus, DiscountType, PaymentCoupon};
use learnpay::service::coupon_guard::{coupon_usable, finalize_check, SkipReason};

fn coupon() -> PaymentCoupon {
    PaymentCoupon {
        id: 1,
        code: "LAUNCH10".to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: 1_000,
        currency: None,
        valid_from: None,
        valid_until: None,
        max_redemptions: Some(100),
        per_user_limit: Some(1),
        times_redeemed: 0,
        status: CouponStatus::Active,
    }
}

#[test]
fn active_coupon_inside_window_is_usable() {
    let now = Utc::now();
    let mut c = coupon();
    c.valid_from = Some(now - Duration::days(1));
    c.valid_until = Some(now + Duration::days(1));
    assert!(coupon_usable(&c, now).is_ok());
}

#[test]
fn inactive_coupon_is_rejected() {
    let mut c = coupon();
    c.status = CouponStatus::Inactive;
    assert_eq!(coupon_usable(&c, Utc::now()), Err(SkipReason::Inactive));
}

#[test]
fn window_bounds_are_enforced() {
    let now = Utc::now();

    let mut not_yet = coupon();
    not_yet.valid_from = Some(now + Duration::hours(1));
    assert_eq!(coupon_usable(&not_yet, now), Err(SkipReason::OutsideWindow));

    let mut expired = coupon();
    expired.valid_until = Some(now - Duration::hours(1));
    assert_eq!(coupon_usable(&expired, now), Err(SkipReason::OutsideWindow));
}

#[test]
fn open_ended_windows_are_fine() {
    assert!(coupon_usable(&coupon(), Utc::now()).is_ok());
}

#[test]
fn finalize_recheck_catches_per_user_races() {
    // Preview saw zero redemptions; a concurrent payment got there first.
    let c = coupon();
    assert!(finalize_check(&c, 0, Utc::now()).is_ok());
    assert_eq!(
        finalize_check(&c, 1, Utc::now()),
        Err(SkipReason::PerUserLimitReached)
    );
}

#[test]
fn finalize_recheck_catches_global_exhaustion() {
    let mut c = coupon();
    c.times_redeemed = 100;
    assert_eq!(
        finalize_check(&c, 0, Utc::now()),
        Err(SkipReason::GloballyExhausted)
    );
}

#[test]
fn unlimited_coupons_skip_the_caps() {
    let mut c = coupon();
    c.max_redemptions = None;
    c.per_user_limit = None;
    c.times_redeemed = 10_000;
    assert!(finalize_check(&c, 500, Utc::now()).is_ok());
}
