//! The cart store: the only way to change the cart.
//!
//! # Guarantees
//!
//! - Every accepted mutation is validated against a fresh stock lookup.
//! - Mutations are serialized: each one holds the writer lock from reading
//!   the current cart to committing the new one, so concurrent calls cannot
//!   lose each other's updates.
//! - Write-through: the new cart is written to storage before it replaces
//!   the in-memory cart. If the write fails, nothing changes.
//! - A rejected operation returns a typed [`CartError`], emits the matching
//!   [`Notice`] and leaves the cart untouched. The store stays usable.

use std::io;
use std::sync::Arc;

use rocketshoes_core::{ProductId, StockLevel};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::cart::{Cart, CartItem};
use crate::error::{CartError, CartErrorKind, Result};
use crate::inventory::Inventory;
use crate::notifier::{Notice, Notifier};
use crate::storage::{CartStorage, DEFAULT_CART_KEY, StorageError};

/// Arguments for [`CartStore::update_product_amount`].
///
/// `amount` is signed because callers may pass anything a quantity input
/// produces; values below 1 are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Shopping cart with stock-checked mutations and write-through persistence.
///
/// Cheaply cloneable via `Arc`; clones share the same cart. Create one at the
/// application root and hand it to whatever needs the cart.
pub struct CartStore<I, S, N> {
    inner: Arc<CartStoreInner<I, S, N>>,
}

struct CartStoreInner<I, S, N> {
    inventory: I,
    storage: S,
    notifier: N,
    storage_key: String,
    cart: RwLock<Cart>,
    /// Held for the whole of a mutation.
    writer: Mutex<()>,
}

impl<I, S, N> Clone for CartStore<I, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, S, N> CartStore<I, S, N>
where
    I: Inventory + 'static,
    S: CartStorage + 'static,
    N: Notifier + 'static,
{
    /// Create a store, restoring the cart saved under the default key.
    #[must_use]
    pub fn new(inventory: I, storage: S, notifier: N) -> Self {
        Self::with_key(inventory, storage, notifier, DEFAULT_CART_KEY)
    }

    /// Create a store, restoring the cart saved under `storage_key`.
    ///
    /// A missing snapshot yields an empty cart. So does an unreadable or
    /// corrupt one, but that case is logged as a warning.
    #[must_use]
    pub fn with_key(inventory: I, storage: S, notifier: N, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let cart = load_cart(&storage, &storage_key);

        Self {
            inner: Arc::new(CartStoreInner {
                inventory,
                storage,
                notifier,
                storage_key,
                cart: RwLock::new(cart),
                writer: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current cart.
    pub async fn cart(&self) -> Cart {
        self.inner.cart.read().await.clone()
    }

    /// Add one unit of a product.
    ///
    /// A product not yet in the cart is fetched from the catalog and added
    /// with amount 1 if any stock is available. A product already in the cart
    /// is incremented by 1 if stock exceeds its current amount.
    ///
    /// Emits `ProductAdded` on success, `StockExceeded` when stock runs out
    /// and `AddFailed` for any other failure.
    ///
    /// # Errors
    ///
    /// - `CartError::OutOfStock` if stock does not cover one more unit
    /// - `CartError::Inventory` / `Storage` / `Serialize` if a collaborator failed
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<CartItem> {
        let result = self.try_add_product(product_id).await;

        match &result {
            Ok(item) => {
                info!(amount = item.amount, "Product added to cart");
                self.inner.notifier.notify(Notice::ProductAdded);
            }
            Err(err) => {
                let notice = match err.kind() {
                    CartErrorKind::OutOfStock => Notice::StockExceeded,
                    _ => Notice::AddFailed,
                };
                self.reject(err, notice);
            }
        }

        result
    }

    /// Remove a product's line entirely.
    ///
    /// Emits `RemoveFailed` on failure and nothing on success.
    ///
    /// # Errors
    ///
    /// - `CartError::ProductNotInCart` if the product has no line
    /// - `CartError::Storage` / `Serialize` if the snapshot could not be saved
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<CartItem> {
        let result = self.try_remove_product(product_id).await;

        match &result {
            Ok(item) => info!(amount = item.amount, "Product removed from cart"),
            Err(err) => self.reject(err, Notice::RemoveFailed),
        }

        result
    }

    /// Set a product's amount to exactly `amount`.
    ///
    /// Checks run in order and stop at the first failure: quantity at least 1,
    /// quantity within current stock, product present in the cart.
    ///
    /// Emits `InvalidQuantity`, `StockExceeded` or `UpdateFailed` on failure
    /// and nothing on success.
    ///
    /// # Errors
    ///
    /// - `CartError::InvalidQuantity` if `amount < 1`
    /// - `CartError::OutOfStock` if `amount` exceeds stock
    /// - `CartError::ProductNotInCart` if the product has no line
    /// - `CartError::Inventory` / `Storage` / `Serialize` if a collaborator failed
    #[instrument(skip_all, fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(&self, update: UpdateProductAmount) -> Result<CartItem> {
        let result = self.try_update_product_amount(update).await;

        match &result {
            Ok(item) => info!(amount = item.amount, "Product amount updated"),
            Err(err) => {
                let notice = match err.kind() {
                    CartErrorKind::InvalidQuantity => Notice::InvalidQuantity,
                    CartErrorKind::OutOfStock => Notice::StockExceeded,
                    CartErrorKind::ProductNotInCart | CartErrorKind::ServiceFailure => {
                        Notice::UpdateFailed
                    }
                };
                self.reject(err, notice);
            }
        }

        result
    }

    // =========================================================================
    // Operation bodies
    // =========================================================================

    async fn try_add_product(&self, product_id: ProductId) -> Result<CartItem> {
        let _writer = self.inner.writer.lock().await;
        let mut cart = self.cart().await;

        let current = cart.get(product_id).map(|item| item.amount);
        let item = match current {
            Some(amount) => {
                let requested = amount.saturating_add(1);
                let stock = self.inner.inventory.stock(product_id).await?;
                ensure_stock(product_id, &stock, requested)?;

                cart.set_amount(product_id, requested)
                    .cloned()
                    .ok_or(CartError::ProductNotInCart(product_id))?
            }
            None => {
                let (product, stock) = tokio::try_join!(
                    self.inner.inventory.product(product_id),
                    self.inner.inventory.stock(product_id),
                )?;
                ensure_stock(product_id, &stock, 1)?;

                cart.push(product)
                    .cloned()
                    .ok_or(CartError::ProductNotInCart(product_id))?
            }
        };

        self.commit(cart).await?;
        Ok(item)
    }

    async fn try_remove_product(&self, product_id: ProductId) -> Result<CartItem> {
        let _writer = self.inner.writer.lock().await;
        let mut cart = self.cart().await;

        let removed = cart
            .remove(product_id)
            .ok_or(CartError::ProductNotInCart(product_id))?;

        self.commit(cart).await?;
        Ok(removed)
    }

    async fn try_update_product_amount(&self, update: UpdateProductAmount) -> Result<CartItem> {
        let UpdateProductAmount { product_id, amount } = update;

        if amount < 1 {
            return Err(CartError::InvalidQuantity(amount));
        }
        // Anything past u32::MAX can never be in stock.
        let requested = u32::try_from(amount).unwrap_or(u32::MAX);

        let _writer = self.inner.writer.lock().await;

        let stock = self.inner.inventory.stock(product_id).await?;
        ensure_stock(product_id, &stock, requested)?;

        let mut cart = self.cart().await;
        let item = cart
            .set_amount(product_id, requested)
            .cloned()
            .ok_or(CartError::ProductNotInCart(product_id))?;

        self.commit(cart).await?;
        Ok(item)
    }

    /// Persist `cart`, then make it the current cart.
    ///
    /// Must be called with the writer lock held. The storage write runs on
    /// the blocking pool since backends do synchronous I/O.
    async fn commit(&self, cart: Cart) -> Result<()> {
        let snapshot = serde_json::to_string(&cart)?;

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.storage.set(&inner.storage_key, &snapshot))
            .await
            .map_err(|e| StorageError::Io(io::Error::other(e)))??;

        *self.inner.cart.write().await = cart;
        Ok(())
    }

    fn reject(&self, err: &CartError, notice: Notice) {
        if err.is_service_failure() {
            warn!(error = %err, "Cart operation failed");
        } else {
            debug!(error = %err, "Cart operation rejected");
        }
        self.inner.notifier.notify(notice);
    }
}

fn ensure_stock(product_id: ProductId, stock: &StockLevel, requested: u32) -> Result<()> {
    if stock.covers(requested) {
        Ok(())
    } else {
        Err(CartError::OutOfStock {
            product_id,
            requested,
            available: stock.amount,
        })
    }
}

/// Restore the saved cart, falling back to an empty one.
fn load_cart<S: CartStorage>(storage: &S, storage_key: &str) -> Cart {
    match storage.get(storage_key) {
        Ok(None) => {
            debug!(storage_key, "No saved cart, starting empty");
            Cart::new()
        }
        Ok(Some(snapshot)) => match serde_json::from_str::<Cart>(&snapshot) {
            Ok(cart) => {
                debug!(storage_key, items = cart.len(), "Restored saved cart");
                cart
            }
            Err(e) => {
                warn!(
                    storage_key,
                    error = %e,
                    "Saved cart is corrupt, starting with an empty cart"
                );
                Cart::new()
            }
        },
        Err(e) => {
            warn!(
                storage_key,
                error = %e,
                "Could not read saved cart, starting with an empty cart"
            );
            Cart::new()
        }
    }
}
