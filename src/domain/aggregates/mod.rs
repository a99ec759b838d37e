//! Aggregates module
pub mod product;
pub mod basket;
pub mod order;

pub use product::{Product, ProductError, ProductImage, ProductOption};
pub use basket::{Basket, BasketEntry, BasketError, Shortage, StockedOption};
pub use order::{Customer, OrderDraft, OrderError, PaidStatus, PlacedOrder};
