//! Day-of-week discounts.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

use super::discount_from_db;
use crate::domain::pricing::{DayDiscount, DayDiscountTier};

#[derive(Debug, FromRow)]
struct DayDiscountRow {
    id: i64,
    title: Option<String>,
    min_price_for_discount: Option<i32>,
    discount_amount: Option<i32>,
}

/// Storefront shape of a day discount.
#[derive(Debug, Clone, Serialize)]
pub struct DayDiscountView {
    pub title: Option<String>,
    pub options: Vec<DayDiscountTierView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayDiscountTierView {
    pub min_price_for_discount: Decimal,
    pub discount_amount: u32,
}

impl From<&DayDiscount> for DayDiscountView {
    fn from(d: &DayDiscount) -> Self {
        Self {
            title: d.title.clone(),
            options: d.tiers().iter().map(|t| DayDiscountTierView {
                min_price_for_discount: t.min_total,
                discount_amount: t.discount.value(),
            }).collect(),
        }
    }
}

/// Active day discounts for `weekday` (0 = Monday), oldest first.
pub async fn active_for_weekday<'e, E>(executor: E, weekday: u32) -> Result<Vec<DayDiscount>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, DayDiscountRow>(
        "SELECT d.id, d.title, t.min_price_for_discount, t.discount_amount \
         FROM discounts_by_day d LEFT JOIN discount_by_day_tiers t ON t.discount_by_day_id = d.id \
         WHERE d.is_active AND $1 = ANY(d.week_days) \
         ORDER BY d.id, t.min_price_for_discount DESC",
    )
    .bind(weekday as i32)
    .fetch_all(executor)
    .await?;
    Ok(group_rows(rows))
}

fn group_rows(rows: Vec<DayDiscountRow>) -> Vec<DayDiscount> {
    let mut grouped: Vec<(i64, Option<String>, Vec<DayDiscountTier>)> = Vec::new();
    for row in rows {
        if grouped.last().map(|g| g.0) != Some(row.id) {
            grouped.push((row.id, row.title.clone(), Vec::new()));
        }
        let tier = match (row.min_price_for_discount, discount_from_db(row.discount_amount)) {
            (Some(min), Some(discount)) => Some(DayDiscountTier { min_total: Decimal::from(min), discount }),
            _ => None,
        };
        if let (Some(tier), Some(group)) = (tier, grouped.last_mut()) {
            group.2.push(tier);
        }
    }
    grouped.into_iter().map(|(_, title, tiers)| DayDiscount::new(title, tiers)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, min: Option<i32>, amount: Option<i32>) -> DayDiscountRow {
        DayDiscountRow { id, title: Some(format!("d{id}")), min_price_for_discount: min, discount_amount: amount }
    }

    #[test]
    fn test_group_rows_keeps_tiers_per_discount() {
        let grouped = group_rows(vec![
            row(1, Some(100), Some(10)),
            row(1, Some(50), Some(5)),
            row(2, None, None),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].tiers().len(), 2);
        assert_eq!(grouped[0].tiers()[0].min_total, Decimal::from(100));
        assert!(grouped[1].tiers().is_empty());
    }

    #[test]
    fn test_view_shape() {
        let grouped = group_rows(vec![row(1, Some(30), Some(3))]);
        let view = DayDiscountView::from(&grouped[0]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["options"][0]["discount_amount"], 3);
        assert_eq!(json["title"], "d1");
    }
}
