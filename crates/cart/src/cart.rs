//! The cart model: an ordered list of products with quantities.
//!
//! A [`Cart`] is a plain value. Everything outside this crate can read it,
//! but only [`CartStore`](crate::CartStore) can change the cart it holds.

use rocketshoes_core::{CurrencyCode, Price, Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A product placed in the cart, with its quantity.
///
/// Serialized flat: `{ "id", "title", "price", "image", "amount" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    /// Product ID of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount.
    #[must_use]
    pub fn line_total(&self, currency_code: CurrencyCode) -> Price {
        Price::new(
            self.product.price * Decimal::from(self.amount),
            currency_code,
        )
    }
}

/// Stored cart data that breaks the cart invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartDataError {
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),
    #[error("product {0} has a zero amount")]
    ZeroAmount(ProductId),
}

/// The shopping cart.
///
/// Invariants: product IDs are unique and every amount is at least 1.
/// Insertion order is preserved. Serialized as a bare JSON array of
/// [`CartItem`]s; deserializing data that breaks an invariant fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over cart lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == product_id)
    }

    /// Whether the product is in the cart.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Number of distinct products (the header badge count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self, currency_code: CurrencyCode) -> Price {
        let amount = self
            .items
            .iter()
            .map(|item| item.line_total(currency_code).amount)
            .sum();
        Price::new(amount, currency_code)
    }

    /// Append a product with amount 1. Returns `None` if it is already present.
    pub(crate) fn push(&mut self, product: Product) -> Option<&CartItem> {
        if self.contains(product.id) {
            return None;
        }
        self.items.push(CartItem { product, amount: 1 });
        self.items.last()
    }

    /// Set the amount of an existing line.
    ///
    /// Returns `None` if the product is absent. A zero amount is refused.
    pub(crate) fn set_amount(&mut self, product_id: ProductId, amount: u32) -> Option<&CartItem> {
        if amount == 0 {
            return None;
        }
        let item = self.items.iter_mut().find(|item| item.id() == product_id)?;
        item.amount = amount;
        Some(item)
    }

    /// Remove a line, keeping the relative order of the rest.
    pub(crate) fn remove(&mut self, product_id: ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id() == product_id)?;
        Some(self.items.remove(index))
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartDataError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CartDataError::ZeroAmount(item.id()));
            }
            if items
                .iter()
                .skip(index + 1)
                .any(|other| other.id() == item.id())
            {
                return Err(CartDataError::DuplicateProduct(item.id()));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
