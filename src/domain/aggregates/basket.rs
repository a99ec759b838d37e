//! Basket Aggregate

use std::collections::HashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use crate::domain::aggregates::product::ProductOption;
use crate::domain::pricing::{price_basket, BasketLine, BasketTotals, DayDiscount};
use crate::domain::value_objects::{ArticleNumber, DiscountPercent};

/// An option as loaded for checkout, with the product context pricing needs.
#[derive(Clone, Debug)]
pub struct StockedOption {
    pub option: ProductOption,
    pub product_name: String,
    pub product_discount: Option<DiscountPercent>,
}

#[derive(Clone, Debug)]
pub struct BasketEntry {
    pub article_number: ArticleNumber,
    pub product_name: String,
    pub option: ProductOption,
    pub product_discount: Option<DiscountPercent>,
    /// As ordered: grams for sold-by-weight options, pieces otherwise.
    pub quantity: Decimal,
}

impl BasketEntry {
    pub fn line(&self) -> BasketLine {
        BasketLine {
            price: self.option.price,
            quantity: self.quantity,
            partial: self.option.partial,
            option_discount: self.option.discount,
            product_discount: self.product_discount,
        }
    }

    pub fn billable(&self) -> Decimal { self.line().billable() }
}

/// A line that cannot be served from stock. Both quantities are in stock
/// units: kilograms for sold-by-weight options, pieces otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Shortage {
    pub article_number: ArticleNumber,
    pub requested: Decimal,
    pub stock_balance: Decimal,
}

#[derive(Clone, Debug, Default)]
pub struct Basket {
    entries: Vec<BasketEntry>,
}

impl Basket {
    pub fn new() -> Self { Self::default() }

    /// Build a basket from requested `(article, quantity)` pairs and the options
    /// loaded for them.
    pub fn assemble(
        items: &[(ArticleNumber, Decimal)],
        catalog: &HashMap<ArticleNumber, StockedOption>,
    ) -> Result<Self, BasketError> {
        let mut basket = Self::new();
        for (article, quantity) in items {
            if *quantity <= Decimal::ZERO { return Err(BasketError::InvalidQuantity(article.clone())); }
            let stocked = catalog.get(article).ok_or_else(|| BasketError::UnknownArticle(article.clone()))?;
            if !stocked.option.is_active { return Err(BasketError::Unavailable(article.clone())); }
            basket.add_entry(BasketEntry {
                article_number: article.clone(),
                product_name: stocked.product_name.clone(),
                option: stocked.option.clone(),
                product_discount: stocked.product_discount,
                quantity: *quantity,
            });
        }
        Ok(basket)
    }

    pub fn entries(&self) -> &[BasketEntry] { &self.entries }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn add_entry(&mut self, entry: BasketEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.article_number == entry.article_number) {
            existing.quantity += entry.quantity;
        } else {
            self.entries.push(entry);
        }
    }

    /// Every entry the warehouse cannot serve.
    pub fn shortages(&self) -> Vec<Shortage> {
        self.entries
            .iter()
            .filter(|e| e.billable() > e.option.stock_balance)
            .map(|e| Shortage {
                article_number: e.article_number.clone(),
                requested: e.billable(),
                stock_balance: e.option.stock_balance,
            })
            .collect()
    }

    pub fn check_stock(&self) -> Result<(), BasketError> {
        let shortages = self.shortages();
        if shortages.is_empty() { Ok(()) } else { Err(BasketError::OutOfStock(shortages)) }
    }

    pub fn lines(&self) -> Vec<BasketLine> { self.entries.iter().map(BasketEntry::line).collect() }

    pub fn price(&self, day: Option<&DayDiscount>) -> BasketTotals { price_basket(&self.lines(), day) }

    /// Distinct products in the basket, in first-seen order.
    pub fn product_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            if !ids.contains(&e.option.product_id) { ids.push(e.option.product_id); }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BasketError {
    #[error("Unknown article {0}")]
    UnknownArticle(ArticleNumber),
    #[error("Article {0} is not on sale")]
    Unavailable(ArticleNumber),
    #[error("Invalid quantity for article {0}")]
    InvalidQuantity(ArticleNumber),
    #[error("{} item(s) out of stock", .0.len())]
    OutOfStock(Vec<Shortage>),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::option;

    pub(crate) fn catalog(options: Vec<ProductOption>) -> HashMap<ArticleNumber, StockedOption> {
        options
            .into_iter()
            .map(|o| {
                let article = o.article_number.clone().unwrap();
                let product_name = format!("Product {}", o.product_id);
                (article, StockedOption { option: o, product_name, product_discount: None })
            })
            .collect()
    }

    fn art(s: &str) -> ArticleNumber { ArticleNumber::new(s).unwrap() }

    #[test]
    fn test_assemble_merges_repeated_articles() {
        let catalog = catalog(vec![option(1, 10, 1000, 5)]);
        let items = [(art("ART-1"), Decimal::from(2)), (art("ART-1"), Decimal::from(1))];
        let basket = Basket::assemble(&items, &catalog).unwrap();
        assert_eq!(basket.entries().len(), 1);
        assert_eq!(basket.entries()[0].quantity, Decimal::from(3));
        assert_eq!(basket.price(None).total, Decimal::new(3000, 2));
    }

    #[test]
    fn test_unknown_article() {
        let catalog = catalog(vec![]);
        let err = Basket::assemble(&[(art("NOPE"), Decimal::ONE)], &catalog).unwrap_err();
        assert_eq!(err, BasketError::UnknownArticle(art("NOPE")));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(BasketError::UnknownArticle(art("X-1")).to_string(), "Unknown article X-1");
        let err: Box<dyn std::error::Error> = Box::new(BasketError::OutOfStock(vec![]));
        assert_eq!(err.to_string(), "0 item(s) out of stock");
    }

    #[test]
    fn test_reports_every_shortage() {
        let catalog = catalog(vec![option(1, 10, 1000, 1), option(2, 11, 1000, 5), option(3, 12, 500, 2)]);
        let items = [(art("ART-1"), Decimal::from(2)), (art("ART-2"), Decimal::from(5)), (art("ART-3"), Decimal::from(4))];
        let basket = Basket::assemble(&items, &catalog).unwrap();
        match basket.check_stock() {
            Err(BasketError::OutOfStock(s)) => {
                let articles: Vec<&str> = s.iter().map(|x| x.article_number.as_str()).collect();
                assert_eq!(articles, vec!["ART-1", "ART-3"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_partial_stock_checked_in_kilograms() {
        let mut o = option(1, 10, 2000, 2);
        o.partial = true;
        let catalog = catalog(vec![o]);
        let ok = Basket::assemble(&[(art("ART-1"), Decimal::from(1500))], &catalog).unwrap();
        assert!(ok.check_stock().is_ok());
        let short = Basket::assemble(&[(art("ART-1"), Decimal::from(2500))], &catalog).unwrap();
        match short.check_stock() {
            Err(BasketError::OutOfStock(s)) => {
                assert_eq!(s[0].requested, Decimal::new(25, 1));
                assert_eq!(s[0].stock_balance, Decimal::from(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_product_ids_distinct() {
        let catalog = catalog(vec![option(1, 10, 1000, 5), option(2, 10, 1500, 5), option(3, 11, 500, 5)]);
        let items = [(art("ART-1"), Decimal::ONE), (art("ART-2"), Decimal::ONE), (art("ART-3"), Decimal::ONE)];
        let basket = Basket::assemble(&items, &catalog).unwrap();
        assert_eq!(basket.product_ids(), vec![10, 11]);
    }
}
