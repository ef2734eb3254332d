use crate::domain::coupon::DiscountType;
use crate::domain::error::PaymentError;
use crate::domain::intent::TaxSummary;
use crate::totals::allocate::{allocate_pro_rata, reconcile};
use crate::totals::types::{DiscountSpec, ItemBreakdown, LineItem, TaxRate, TotalsBreakdown};

const MAX_DISCOUNT_BASIS_POINTS: i64 = 10_000;

/// Computes the exact-cent breakdown for a set of line items. Pure: no I/O,
/// no clock, all amounts in integer minor units.
pub fn compute_totals(
    items: &[LineItem],
    discount: Option<&DiscountSpec>,
    tax_rate: Option<&TaxRate>,
    currency: &str,
) -> Result<TotalsBreakdown, PaymentError> {
    if items.is_empty() {
        return Err(PaymentError::validation("line items must not be empty"));
    }
    if let Some(rate) = tax_rate {
        if !rate.rate.is_finite() || rate.rate < 0.0 {
            return Err(PaymentError::validation(
                "tax rate must be a non-negative number",
            ));
        }
    }
    for item in items {
        if item.unit_amount <= 0 {
            return Err(PaymentError::validation("unit_amount must be a positive integer"));
        }
        if item.quantity <= 0 {
            return Err(PaymentError::validation("quantity must be a positive integer"));
        }
    }

    let amounts: Vec<i64> = items
        .iter()
        .map(|i| {
            i.unit_amount
                .checked_mul(i.quantity)
                .ok_or_else(|| PaymentError::validation("line item amount overflows"))
        })
        .collect::<Result<_, _>>()?;
    let subtotal: i64 = amounts.iter().sum();
    let taxable_bases: Vec<i64> = items
        .iter()
        .zip(&amounts)
        .map(|(item, amount)| if item.tax_exempt { 0 } else { *amount })
        .collect();
    let taxable_subtotal: i64 = taxable_bases.iter().sum();

    let total_discount = match discount {
        None => 0,
        Some(spec) => match spec.kind {
            DiscountType::Percentage => {
                let bp = spec.value.min(MAX_DISCOUNT_BASIS_POINTS).max(0);
                (taxable_subtotal as i128 * bp as i128 / 10_000) as i64
            }
            DiscountType::Fixed => {
                match &spec.currency {
                    Some(c) if c.eq_ignore_ascii_case(currency) => {}
                    _ => {
                        return Err(PaymentError::validation(
                            "coupon currency does not match payment currency",
                        ))
                    }
                }
                spec.value.max(0).min(taxable_subtotal)
            }
        },
    };

    let item_discounts = allocate_pro_rata(&taxable_bases, total_discount);
    let taxable_after_discount = taxable_subtotal - total_discount;

    let after_discount_bases: Vec<i64> = taxable_bases
        .iter()
        .zip(&item_discounts)
        .map(|(basis, disc)| basis - disc)
        .collect();

    let (item_taxes, total_tax, tax_summary) = match tax_rate {
        None => (vec![0; items.len()], 0, None),
        Some(rate) => {
            let expected = expected_tax(taxable_after_discount, rate);
            let mut taxes: Vec<i64> = after_discount_bases
                .iter()
                .map(|basis| per_item_tax(*basis, rate))
                .collect();
            reconcile(&mut taxes, &after_discount_bases, expected);
            let summary = TaxSummary {
                jurisdiction: rate.jurisdiction.clone(),
                rate: rate.rate,
                inclusive: rate.inclusive,
                taxable_amount: taxable_after_discount,
            };
            (taxes, expected, Some(summary))
        }
    };

    let inclusive = tax_rate.map(|r| r.inclusive).unwrap_or(false);
    let total = if inclusive {
        subtotal - total_discount
    } else {
        subtotal - total_discount + total_tax
    };

    let breakdown_items = amounts
        .iter()
        .zip(&item_discounts)
        .zip(&item_taxes)
        .map(|((amount, disc), tax)| ItemBreakdown {
            amount: *amount,
            discount: *disc,
            tax: *tax,
        })
        .collect();

    Ok(TotalsBreakdown {
        subtotal,
        discount: total_discount,
        tax: total_tax,
        total,
        taxable_subtotal,
        taxable_after_discount,
        items: breakdown_items,
        tax_summary,
    })
}

fn expected_tax(taxable_after_discount: i64, rate: &TaxRate) -> i64 {
    let base = taxable_after_discount as f64;
    if rate.inclusive {
        (base - base / (1.0 + rate.rate)).round() as i64
    } else {
        (base * rate.rate).round() as i64
    }
}

fn per_item_tax(basis: i64, rate: &TaxRate) -> i64 {
    let base = basis as f64;
    if rate.inclusive {
        (base - base / (1.0 + rate.rate)).round() as i64
    } else {
        (base * rate.rate).round() as i64
    }
}
