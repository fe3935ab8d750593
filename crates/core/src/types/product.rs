//! Catalog records served by the inventory API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// A catalog product.
///
/// Catalog data is immutable from the cart's point of view. The price is kept
/// as a decimal but travels as a JSON number, matching the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

impl Product {
    /// Unit price in the given currency.
    #[must_use]
    pub const fn unit_price(&self, currency_code: CurrencyCode) -> Price {
        Price::new(self.price, currency_code)
    }
}

/// Units of a product currently available for sale.
///
/// Stock is always fetched fresh; it is never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    #[serde(alias = "productId")]
    pub id: ProductId,
    pub amount: u32,
}

impl StockLevel {
    /// Whether at least `requested` units can be sold.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
