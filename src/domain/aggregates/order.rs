//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::basket::{Basket, BasketError, Shortage};
use crate::domain::events::{DomainEvent, OrderEvent, OrderedItem};
use crate::domain::pricing::{BasketTotals, DayDiscount};
use crate::domain::value_objects::{PersonName, PhoneNumber};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Customer { pub phone_number: PhoneNumber, pub customer_name: PersonName }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PaidStatus { #[default] Unpaid, Paid }

impl From<PaidStatus> for i32 {
    fn from(value: PaidStatus) -> Self { match value { PaidStatus::Unpaid => 0, PaidStatus::Paid => 1 } }
}

impl TryFrom<i32> for PaidStatus {
    type Error = String;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value { 0 => Ok(Self::Unpaid), 1 => Ok(Self::Paid), other => Err(format!("unknown paid flag {other}")) }
    }
}

/// A priced, stock-checked order ready to be persisted.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    reference: Uuid,
    customer: Customer,
    basket: Basket,
    totals: BasketTotals,
    paid: PaidStatus,
    created_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl OrderDraft {
    /// Price `basket` and verify it can be served. When the storefront sent the
    /// total it showed the customer, it has to match the server's figure.
    pub fn place(
        customer: Customer,
        basket: Basket,
        day_discount: Option<&DayDiscount>,
        expected_total: Option<Decimal>,
    ) -> Result<Self, OrderError> {
        if basket.is_empty() { return Err(OrderError::NoItems); }
        basket.check_stock().map_err(|e| match e {
            BasketError::OutOfStock(s) => OrderError::OutOfStock(s),
            other => OrderError::Basket(other),
        })?;
        let totals = basket.price(day_discount);
        if let Some(expected) = expected_total {
            if expected != totals.total {
                return Err(OrderError::PriceMismatch { expected, actual: totals.total });
            }
        }

        let mut draft = Self {
            reference: Uuid::now_v7(), customer, basket, totals,
            paid: PaidStatus::Unpaid, created_at: Utc::now(), events: vec![],
        };
        draft.raise_event(DomainEvent::Order(OrderEvent::Placed {
            reference: draft.reference,
            customer_name: draft.customer.customer_name.to_string(),
            phone_number: draft.customer.phone_number.to_string(),
            total: draft.totals.total,
            total_without_discount: draft.totals.total_without_discount,
            items: draft.basket.entries().iter().map(|e| OrderedItem {
                article_number: e.article_number.to_string(),
                product_name: e.product_name.clone(),
                quantity: e.quantity,
                partial: e.option.partial,
                billable: e.billable(),
                stock_balance: e.option.stock_balance,
                price: e.option.price,
            }).collect(),
        }));
        Ok(draft)
    }

    pub fn reference(&self) -> Uuid { self.reference }
    pub fn customer(&self) -> &Customer { &self.customer }
    pub fn basket(&self) -> &Basket { &self.basket }
    pub fn totals(&self) -> &BasketTotals { &self.totals }
    pub fn paid(&self) -> PaidStatus { self.paid }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// What the storefront gets back after a successful checkout.
#[derive(Clone, Debug, Serialize)]
pub struct PlacedOrder {
    pub id: i64,
    pub reference: Uuid,
    pub total: Decimal,
    pub total_without_discount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("No items")]
    NoItems,
    #[error("{} item(s) out of stock", .0.len())]
    OutOfStock(Vec<Shortage>),
    #[error("Basket total {expected} does not match {actual}")]
    PriceMismatch { expected: Decimal, actual: Decimal },
    #[error("{0}")]
    Basket(BasketError),
}

impl From<BasketError> for OrderError {
    fn from(e: BasketError) -> Self {
        match e { BasketError::OutOfStock(s) => Self::OutOfStock(s), other => Self::Basket(other) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::basket::tests::catalog;
    use crate::domain::aggregates::product::tests::option;
    use crate::domain::value_objects::ArticleNumber;

    fn customer() -> Customer {
        Customer { phone_number: PhoneNumber::parse("+375291234567").unwrap(), customer_name: PersonName::parse("Anna Ivanova").unwrap() }
    }

    fn basket(qty: i64) -> Basket {
        let catalog = catalog(vec![option(1, 10, 1250, 4)]);
        Basket::assemble(&[(ArticleNumber::new("ART-1").unwrap(), Decimal::from(qty))], &catalog).unwrap()
    }

    #[test]
    fn test_place_order_raises_event() {
        let mut draft = OrderDraft::place(customer(), basket(2), None, Some(Decimal::new(2500, 2))).unwrap();
        assert_eq!(draft.totals().total, Decimal::new(2500, 2));
        assert_eq!(draft.paid(), PaidStatus::Unpaid);
        let events = draft.take_events();
        assert_eq!(events.len(), 1);
        assert!(draft.take_events().is_empty());
    }

    #[test]
    fn test_weighed_order_event_in_stock_units() {
        let mut o = option(1, 10, 1500, 2);
        o.partial = true;
        let catalog = catalog(vec![o]);
        let basket = Basket::assemble(&[(ArticleNumber::new("ART-1").unwrap(), Decimal::from(500))], &catalog).unwrap();
        let mut draft = OrderDraft::place(customer(), basket, None, Some(Decimal::new(750, 2))).unwrap();
        let events = draft.take_events();
        let DomainEvent::Order(OrderEvent::Placed { items, .. }) = &events[0] else { panic!("expected order event") };
        assert_eq!(items[0].quantity, Decimal::from(500));
        assert_eq!(items[0].billable, Decimal::new(5, 1));
        assert!(!events[0].telegram_text().contains("⚠️"));
    }

    #[test]
    fn test_price_mismatch_rejected() {
        let err = OrderDraft::place(customer(), basket(2), None, Some(Decimal::new(2000, 2))).unwrap_err();
        assert_eq!(err, OrderError::PriceMismatch { expected: Decimal::new(2000, 2), actual: Decimal::new(2500, 2) });
    }

    #[test]
    fn test_out_of_stock_rejected() {
        let err = OrderDraft::place(customer(), basket(5), None, None).unwrap_err();
        assert!(matches!(err, OrderError::OutOfStock(ref s) if s.len() == 1));
    }

    #[test]
    fn test_empty_basket_rejected() {
        assert_eq!(OrderDraft::place(customer(), Basket::new(), None, None).unwrap_err(), OrderError::NoItems);
    }
}
