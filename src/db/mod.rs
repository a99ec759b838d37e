//! PostgreSQL access. Every query is a runtime `sqlx` query mapped onto a
//! `FromRow` struct, then converted into domain types where pricing needs them.

pub mod catalog;
pub mod content;
pub mod discounts;
pub mod orders;

use crate::domain::value_objects::DiscountPercent;

/// Discount columns are CHECK-constrained to 1..=90; anything else is dropped.
pub(crate) fn discount_from_db(raw: Option<i32>) -> Option<DiscountPercent> {
    let raw = raw?;
    match u32::try_from(raw).ok().and_then(|v| DiscountPercent::new(v).ok()) {
        Some(d) => Some(d),
        None => {
            tracing::warn!(discount = raw, "ignoring out-of-range discount");
            None
        }
    }
}
