//! Zoo Shop storefront backend
//!
//! REST backend for a pet-supply shop.
//!
//! ## Features
//! - Product catalog with package options, brands, animals and categories
//! - Option, subcategory and day-of-week discounts priced in one place
//! - Checkout with stock decrement
//! - Co-purchase recommendations
//! - Articles, shop info, banners, comments and consultation requests

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod notify;
pub mod recommendations;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::aggregates::{BasketError, OrderError, Shortage};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unknown article {0}")]
    UnknownArticle(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Out of stock")]
    OutOfStock(Vec<Shortage>),

    #[error("Basket total {expected} does not match {actual}")]
    PriceMismatch { expected: Decimal, actual: Decimal },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ShopError>;

impl From<validator::ValidationErrors> for ShopError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<BasketError> for ShopError {
    fn from(e: BasketError) -> Self {
        match e {
            BasketError::UnknownArticle(a) => Self::UnknownArticle(a.to_string()),
            BasketError::OutOfStock(s) => Self::OutOfStock(s),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::Validation(e.to_string()),
            OrderError::OutOfStock(s) => Self::OutOfStock(s),
            OrderError::PriceMismatch { expected, actual } => Self::PriceMismatch { expected, actual },
            OrderError::Basket(b) => b.into(),
        }
    }
}
