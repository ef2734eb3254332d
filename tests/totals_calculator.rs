use learnpay::domain::coupon::DiscountType;
use learnpay::domain::error::PaymentError;
use learnpay::totals::allocate::{allocate_pro_rata, reconcile};
use learnpay::totals::calculator::compute_totals;
use learnpay::totals::types::{DiscountSpec, LineItem, TaxRate};
use proptest::prelude::*;

fn item(unit_amount: i64, quantity: i64) -> LineItem {
    LineItem {
        unit_amount,
        quantity,
        tax_exempt: false,
    }
}

fn percentage(bp: i64) -> DiscountSpec {
    DiscountSpec {
        kind: DiscountType::Percentage,
        value: bp,
        currency: None,
    }
}

fn exclusive_rate(rate: f64) -> TaxRate {
    TaxRate {
        rate,
        jurisdiction: "US".to_string(),
        inclusive: false,
    }
}

#[test]
fn checkout_example_exact_cents() {
    let items = [item(2000, 3)];
    let totals = compute_totals(
        &items,
        Some(&percentage(1_000)),
        Some(&exclusive_rate(0.08)),
        "USD",
    )
    .unwrap();

    assert_eq!(totals.subtotal, 6000);
    assert_eq!(totals.discount, 600);
    assert_eq!(totals.taxable_after_discount, 5400);
    assert_eq!(totals.tax, 432);
    assert_eq!(totals.total, 5832);
}

#[test]
fn rejects_empty_line_items() {
    let err = compute_totals(&[], None, None, "USD").unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));
}

#[test]
fn rejects_non_positive_amounts() {
    assert!(matches!(
        compute_totals(&[item(0, 1)], None, None, "USD"),
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        compute_totals(&[item(100, 0)], None, None, "USD"),
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        compute_totals(&[item(100, -2)], None, None, "USD"),
        Err(PaymentError::Validation(_))
    ));
}

#[test]
fn fixed_coupon_requires_matching_currency() {
    let discount = DiscountSpec {
        kind: DiscountType::Fixed,
        value: 500,
        currency: Some("EUR".to_string()),
    };
    let err = compute_totals(&[item(1000, 2)], Some(&discount), None, "USD").unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));
}

#[test]
fn fixed_coupon_clamps_to_taxable_subtotal() {
    let discount = DiscountSpec {
        kind: DiscountType::Fixed,
        value: 10_000,
        currency: Some("usd".to_string()),
    };
    let totals = compute_totals(&[item(1000, 2)], Some(&discount), None, "USD").unwrap();
    assert_eq!(totals.discount, 2000);
    assert_eq!(totals.total, 0);
}

#[test]
fn tax_exempt_items_carry_no_discount_or_tax() {
    let items = [
        item(1000, 1),
        LineItem {
            unit_amount: 500,
            quantity: 1,
            tax_exempt: true,
        },
    ];
    let totals = compute_totals(
        &items,
        Some(&percentage(1_000)),
        Some(&exclusive_rate(0.10)),
        "USD",
    )
    .unwrap();

    assert_eq!(totals.subtotal, 1500);
    assert_eq!(totals.taxable_subtotal, 1000);
    assert_eq!(totals.discount, 100);
    assert_eq!(totals.items[1].discount, 0);
    assert_eq!(totals.items[1].tax, 0);
    assert_eq!(totals.tax, 90);
    assert_eq!(totals.total, 1500 - 100 + 90);
}

#[test]
fn inclusive_tax_does_not_change_the_total() {
    let totals = compute_totals(
        &[item(1100, 1)],
        None,
        Some(&TaxRate {
            rate: 0.10,
            jurisdiction: "DE".to_string(),
            inclusive: true,
        }),
        "EUR",
    )
    .unwrap();

    assert_eq!(totals.total, 1100);
    // 1100 - 1100 / 1.1 = 100
    assert_eq!(totals.tax, 100);
}

#[test]
fn item_breakdowns_sum_to_totals() {
    let items = [item(333, 3), item(101, 7), item(999, 1)];
    let totals = compute_totals(
        &items,
        Some(&percentage(1_550)),
        Some(&exclusive_rate(0.0825)),
        "USD",
    )
    .unwrap();

    let disc: i64 = totals.items.iter().map(|i| i.discount).sum();
    let tax: i64 = totals.items.iter().map(|i| i.tax).sum();
    assert_eq!(disc, totals.discount);
    assert_eq!(tax, totals.tax);
}

#[test]
fn remainder_ties_keep_original_order() {
    // Equal bases, remainder of 1: the first item wins.
    let shares = allocate_pro_rata(&[500, 500], 101);
    assert_eq!(shares, vec![51, 50]);
}

#[test]
fn reconcile_never_goes_below_zero() {
    let mut shares = vec![1, 0, 0];
    reconcile(&mut shares, &[10, 5, 1], 0);
    assert_eq!(shares.iter().sum::<i64>(), 0);
    assert!(shares.iter().all(|s| *s >= 0));
}

#[test]
fn reconcile_stops_once_shares_are_exhausted() {
    // A target below zero can never be met; the shares floor at zero.
    let mut shares = vec![1, 2];
    reconcile(&mut shares, &[10, 20], -5);
    assert_eq!(shares, vec![0, 0]);
}

#[test]
fn rejects_negative_or_non_finite_tax_rates() {
    assert!(matches!(
        compute_totals(&[item(1000, 1)], None, Some(&exclusive_rate(-0.05)), "USD"),
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        compute_totals(&[item(1000, 1)], None, Some(&exclusive_rate(f64::NAN)), "USD"),
        Err(PaymentError::Validation(_))
    ));
    assert!(compute_totals(&[item(1000, 1)], None, Some(&exclusive_rate(0.0)), "USD").is_ok());
}

proptest! {
    #[test]
    fn allocation_sums_exactly(
        bases in proptest::collection::vec(0i64..50_000, 1..8),
        total in 1i64..1_000_000,
    ) {
        let shares = allocate_pro_rata(&bases, total);
        prop_assert_eq!(shares.len(), bases.len());
        if bases.iter().sum::<i64>() > 0 {
            prop_assert_eq!(shares.iter().sum::<i64>(), total);
        } else {
            prop_assert!(shares.iter().all(|s| *s == 0));
        }
        prop_assert!(shares.iter().all(|s| *s >= 0));
    }

    #[test]
    fn zero_basis_items_get_nothing(
        bases in proptest::collection::vec(0i64..50_000, 2..8),
        total in 1i64..1_000_000,
    ) {
        let shares = allocate_pro_rata(&bases, total);
        for (basis, share) in bases.iter().zip(&shares) {
            if *basis == 0 {
                prop_assert_eq!(*share, 0);
            }
        }
    }
}
