//! In-process inventory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rocketshoes_core::{Product, ProductId, StockLevel};

use super::{Inventory, InventoryError};

/// Inventory held in memory.
///
/// Stock can be changed at any time with [`set_stock`](Self::set_stock), and
/// the whole service can be taken offline to simulate outages.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    catalog: Mutex<HashMap<ProductId, (Product, u32)>>,
    offline: AtomicBool,
    stock_requests: AtomicUsize,
}

impl MemoryInventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a product with its stock.
    #[must_use]
    pub fn with_product(self, product: Product, stock: u32) -> Self {
        self.insert(product, stock);
        self
    }

    /// Insert or replace a product and its stock.
    pub fn insert(&self, product: Product, stock: u32) {
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.id, (product, stock));
    }

    /// Change the stock of a known product. Unknown IDs are ignored.
    pub fn set_stock(&self, product_id: ProductId, amount: u32) {
        if let Some(entry) = self
            .catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&product_id)
        {
            entry.1 = amount;
        }
    }

    /// Make every request fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stock lookups served so far.
    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.stock_requests.load(Ordering::SeqCst)
    }

    fn lookup(&self, product_id: ProductId) -> Result<(Product, u32), InventoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(InventoryError::Status {
                status: 503,
                body: "inventory offline".to_string(),
            });
        }
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .cloned()
            .ok_or(InventoryError::NotFound(product_id))
    }
}

impl Inventory for MemoryInventory {
    async fn product(&self, product_id: ProductId) -> Result<Product, InventoryError> {
        self.lookup(product_id).map(|(product, _)| product)
    }

    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, InventoryError> {
        self.stock_requests.fetch_add(1, Ordering::SeqCst);
        self.lookup(product_id).map(|(_, amount)| StockLevel {
            id: product_id,
            amount,
        })
    }
}
