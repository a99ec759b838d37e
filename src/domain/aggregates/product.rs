//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use crate::domain::pricing::{CardPricing, PricedOption};
use crate::domain::value_objects::{ArticleNumber, DiscountPercent, Popularity};

/// Unit assigned to every sold-by-weight option.
pub const GRAM_UNIT: &str = "грамм";

/// Package size of a sold-by-weight option, in grams.
pub const PARTIAL_SIZE: i32 = 1000;

/// Decimal places stored for stock balances: one gram of a sold-by-weight option.
pub const STOCK_SCALE: u32 = 3;

#[derive(Clone, Debug, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub features: Option<String>,
    pub composition: Option<String>,
    pub additives: Option<String>,
    pub analysis: Option<String>,
    pub date_added: DateTime<Utc>,
    pub is_active: bool,
    pub brand_id: Option<i64>,
    pub popular: Popularity,
    pub animal_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
    pub subcategory_ids: Vec<i64>,
    pub options: Vec<ProductOption>,
    pub images: Vec<ProductImage>,
    /// Greatest active discount among the product's subcategories.
    pub subcategory_discount: Option<DiscountPercent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductOption {
    pub id: i64,
    pub article_number: Option<ArticleNumber>,
    pub product_id: i64,
    pub partial: bool,
    pub price: Decimal,
    pub size: i32,
    pub stock_balance: Decimal,
    pub is_active: bool,
    pub units: Option<String>,
    #[serde(rename = "discount_by_option")]
    pub discount: Option<DiscountPercent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductImage { pub id: i64, pub image: Option<String> }

impl ProductOption {
    /// Enforce the invariants every stored option keeps.
    pub fn normalize(&mut self) {
        if self.stock_balance <= Decimal::ZERO { self.is_active = false; }
        if self.partial {
            self.size = PARTIAL_SIZE;
            self.units = Some(GRAM_UNIT.to_string());
        }
    }

    pub fn take_stock(&mut self, quantity: Decimal) -> Result<(), ProductError> {
        if quantity <= Decimal::ZERO || quantity.normalize().scale() > STOCK_SCALE {
            return Err(ProductError::InvalidQuantity);
        }
        if quantity > self.stock_balance { return Err(ProductError::InsufficientStock); }
        self.stock_balance -= quantity;
        self.normalize();
        Ok(())
    }

    pub fn priced(&self) -> PricedOption {
        PricedOption {
            id: self.id, price: self.price, partial: self.partial, size: self.size,
            is_active: self.is_active, discount: self.discount,
        }
    }
}

impl Product {
    pub fn active_options(&self) -> impl Iterator<Item = &ProductOption> {
        self.options.iter().filter(|o| o.is_active)
    }

    /// A product stays listed while at least one of its options is on sale.
    pub fn refresh_activity(&mut self) {
        self.is_active = self.options.iter().any(|o| o.is_active);
    }

    pub fn card_pricing(&self) -> CardPricing {
        let priced: Vec<PricedOption> = self.options.iter().map(ProductOption::priced).collect();
        CardPricing::for_product(&priced, self.subcategory_discount)
    }

    pub fn option_by_id(&self, id: i64) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Invalid quantity")]
    InvalidQuantity,
    #[error("Insufficient stock")]
    InsufficientStock,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn option(id: i64, product_id: i64, price: i64, stock: i64) -> ProductOption {
        ProductOption {
            id, article_number: Some(ArticleNumber::new(format!("ART-{id}")).unwrap()), product_id,
            partial: false, price: Decimal::new(price, 2), size: 1, stock_balance: Decimal::from(stock),
            is_active: stock > 0, units: Some("шт".into()), discount: None,
        }
    }

    pub(crate) fn product(id: i64, options: Vec<ProductOption>) -> Product {
        Product {
            id, name: format!("Product {id}"), description: None, features: None, composition: None,
            additives: None, analysis: None, date_added: Utc::now(), is_active: true, brand_id: None,
            popular: Popularity::Standard, animal_ids: vec![1], category_ids: vec![], subcategory_ids: vec![],
            options, images: vec![], subcategory_discount: None,
        }
    }

    #[test]
    fn test_partial_option_normalized() {
        let mut o = option(1, 1, 1200, 10);
        o.partial = true;
        o.size = 250;
        o.normalize();
        assert_eq!(o.size, PARTIAL_SIZE);
        assert_eq!(o.units.as_deref(), Some(GRAM_UNIT));
    }

    #[test]
    fn test_weighed_take_stock_keeps_gram_remainder() {
        let mut o = option(1, 1, 1500, 1);
        o.partial = true;
        o.take_stock(Decimal::new(995, 3)).unwrap();
        assert_eq!(o.stock_balance, Decimal::new(5, 3));
        assert!(o.stock_balance.scale() <= STOCK_SCALE);
        assert!(o.is_active);
        o.take_stock(Decimal::new(5, 3)).unwrap();
        assert!(!o.is_active);
    }

    #[test]
    fn test_take_stock_rejects_sub_gram_quantity() {
        let mut o = option(1, 1, 1500, 1);
        o.partial = true;
        assert_eq!(o.take_stock(Decimal::new(5, 4)), Err(ProductError::InvalidQuantity));
        assert_eq!(o.stock_balance, Decimal::from(1));
    }

    #[test]
    fn test_take_stock_deactivates_when_exhausted() {
        let mut o = option(1, 1, 1000, 3);
        o.take_stock(Decimal::from(2)).unwrap();
        assert!(o.is_active);
        o.take_stock(Decimal::from(1)).unwrap();
        assert!(!o.is_active);
        assert_eq!(o.take_stock(Decimal::from(1)), Err(ProductError::InsufficientStock));
    }

    #[test]
    fn test_product_deactivates_without_active_options() {
        let mut p = product(1, vec![option(1, 1, 1000, 1), option(2, 1, 2000, 0)]);
        p.refresh_activity();
        assert!(p.is_active);
        p.options[0].take_stock(Decimal::ONE).unwrap();
        p.refresh_activity();
        assert!(!p.is_active);
    }

    #[test]
    fn test_card_uses_subcategory_discount() {
        let mut p = product(1, vec![option(1, 1, 1000, 5)]);
        p.subcategory_discount = Some(DiscountPercent::new(20).unwrap());
        let card = p.card_pricing();
        assert_eq!(card.min_price, Some(Decimal::new(800, 2)));
        assert_eq!(card.chosen_option_id, Some(1));
    }
}
