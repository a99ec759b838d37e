//! Checkout persistence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use super::catalog::{OptionRow, OPTION_COLUMNS, OPTION_JOINS};
use super::{discount_from_db, discounts};
use crate::domain::aggregates::{Basket, Customer, OrderDraft, PlacedOrder, ProductOption, StockedOption};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::ArticleNumber;
use crate::ShopError;

#[derive(Debug, FromRow)]
struct StockedOptionRow {
    #[sqlx(flatten)]
    option: OptionRow,
    product_name: String,
    product_discount: Option<i32>,
}

/// A checkout request after input validation.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub customer: Customer,
    pub items: Vec<(ArticleNumber, u32)>,
    pub expected_total: Option<Decimal>,
    /// Weekday whose day discount applies, 0 = Monday.
    pub weekday: u32,
}

/// Outcome of a committed checkout.
#[derive(Debug)]
pub struct Placement {
    pub order: PlacedOrder,
    pub product_ids: Vec<i64>,
    pub events: Vec<DomainEvent>,
}

/// Price, stock-check and persist an order in one transaction. Options are
/// locked for the duration so concurrent checkouts cannot oversell.
pub async fn place_order(pool: &PgPool, checkout: Checkout) -> Result<Placement, ShopError> {
    let mut tx = pool.begin().await?;

    let articles: Vec<String> = checkout.items.iter().map(|(a, _)| a.to_string()).collect();
    let sql = format!(
        "SELECT {OPTION_COLUMNS}, p.name AS product_name, \
         (SELECT MAX(ds.discount_amount) FROM discounts_by_subcategory ds \
           WHERE ds.is_active AND ds.subcategory_id = ANY(p.subcategory_ids)) AS product_discount \
         FROM product_options o JOIN products p ON p.id = o.product_id {OPTION_JOINS} \
         WHERE o.article_number = ANY($1) ORDER BY o.id FOR UPDATE OF o"
    );
    let rows = sqlx::query_as::<_, StockedOptionRow>(&sql).bind(&articles).fetch_all(&mut *tx).await?;
    let catalog: HashMap<ArticleNumber, StockedOption> = rows
        .into_iter()
        .filter_map(|r| {
            let product_discount = discount_from_db(r.product_discount);
            let product_name = r.product_name;
            let option: ProductOption = r.option.into();
            let article = option.article_number.clone()?;
            Some((article, StockedOption { option, product_name, product_discount }))
        })
        .collect();

    let items: Vec<(ArticleNumber, Decimal)> =
        checkout.items.iter().map(|(a, q)| (a.clone(), Decimal::from(*q))).collect();
    let basket = Basket::assemble(&items, &catalog)?;
    let day = discounts::active_for_weekday(&mut *tx, checkout.weekday).await?;
    let mut draft = OrderDraft::place(checkout.customer, basket, day.first(), checkout.expected_total)?;

    let (customer_id,): (i64,) = sqlx::query_as(
        "INSERT INTO customers (phone_number, customer_name, first_order_date, last_order_date) \
         VALUES ($1, $2, NOW(), NOW()) \
         ON CONFLICT (phone_number) DO UPDATE SET customer_name = EXCLUDED.customer_name, last_order_date = NOW() \
         RETURNING id",
    )
    .bind(draft.customer().phone_number.as_str())
    .bind(draft.customer().customer_name.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let (order_id, created): (i64, DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO orders (reference, customer_id, created, paid, total_sum, total_without_discount) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, created",
    )
    .bind(draft.reference())
    .bind(customer_id)
    .bind(draft.created_at())
    .bind(i32::from(draft.paid()))
    .bind(draft.totals().total)
    .bind(draft.totals().total_without_discount)
    .fetch_one(&mut *tx)
    .await?;

    let mut touched_products = Vec::new();
    for entry in draft.basket().entries() {
        let quantity = entry.quantity.to_i32()
            .ok_or_else(|| ShopError::Validation(format!("quantity too large for {}", entry.article_number)))?;
        sqlx::query(
            "INSERT INTO order_items (order_id, article_number, quantity, unit_price, discount_amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(entry.article_number.as_str())
        .bind(quantity)
        .bind(entry.line().unit_price())
        .bind(entry.line().discount().map(|d| d.value() as i32))
        .execute(&mut *tx)
        .await?;

        let mut option = entry.option.clone();
        option
            .take_stock(entry.billable())
            .map_err(|e| ShopError::Validation(format!("{}: {e}", entry.article_number)))?;
        sqlx::query("UPDATE product_options SET stock_balance = $2, is_active = $3, date_updated = NOW() WHERE id = $1")
            .bind(option.id)
            .bind(option.stock_balance)
            .bind(option.is_active)
            .execute(&mut *tx)
            .await?;
        if !touched_products.contains(&option.product_id) { touched_products.push(option.product_id); }
    }

    sqlx::query(
        "UPDATE products p SET is_active = EXISTS ( \
             SELECT 1 FROM product_options o WHERE o.product_id = p.id AND o.is_active) \
         WHERE p.id = ANY($1)",
    )
    .bind(&touched_products)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(order_id, reference = %draft.reference(), total = %draft.totals().total, "order placed");

    let order = PlacedOrder {
        id: order_id,
        reference: draft.reference(),
        total: draft.totals().total,
        total_without_discount: draft.totals().total_without_discount,
        created_at: created,
    };
    Ok(Placement { order, product_ids: draft.basket().product_ids(), events: draft.take_events() })
}
