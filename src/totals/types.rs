use crate::domain::coupon::DiscountType;
use crate::domain::intent::TaxSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub unit_amount: i64,
    pub quantity: i64,
    pub tax_exempt: bool,
}

/// Coupon view consumed by the calculator. `value` is basis points for
/// percentage discounts, minor units for fixed ones.
#[derive(Debug, Clone)]
pub struct DiscountSpec {
    pub kind: DiscountType,
    pub value: i64,
    pub currency: Option<String>,
}

/// Resolved tax rate for a region, as returned by the tax-region resolver.
#[derive(Debug, Clone)]
pub struct TaxRate {
    pub rate: f64,
    pub jurisdiction: String,
    pub inclusive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBreakdown {
    pub amount: i64,
    pub discount: i64,
    pub tax: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsBreakdown {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
    pub taxable_subtotal: i64,
    pub taxable_after_discount: i64,
    pub items: Vec<ItemBreakdown>,
    pub tax_summary: Option<TaxSummary>,
}
