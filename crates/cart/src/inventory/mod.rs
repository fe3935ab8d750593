//! Inventory service: product details and stock levels.
//!
//! # Architecture
//!
//! - [`Inventory`] is the seam the cart store depends on
//! - [`HttpInventory`] talks to the catalog REST API with `reqwest`
//! - [`MemoryInventory`] keeps everything in process, for tests and demos
//!
//! Product details are catalog data and may be cached. Stock levels are
//! always fetched fresh so every cart mutation validates against current
//! stock.

mod http;
mod memory;

use std::future::Future;
use std::sync::Arc;

use rocketshoes_core::{Product, ProductId, StockLevel};
use thiserror::Error;

pub use http::HttpInventory;
pub use memory::MemoryInventory;

/// Errors that can occur when querying the inventory service.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Product does not exist in the catalog.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Service answered with a non-success status.
    #[error("Inventory service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
}

/// Read-only access to the catalog and its stock.
pub trait Inventory: Send + Sync {
    /// Fetch catalog details for a product.
    fn product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Product, InventoryError>> + Send;

    /// Fetch the current stock level for a product.
    fn stock(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<StockLevel, InventoryError>> + Send;
}

impl<T: Inventory> Inventory for Arc<T> {
    fn product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Product, InventoryError>> + Send {
        (**self).product(product_id)
    }

    fn stock(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<StockLevel, InventoryError>> + Send {
        (**self).stock(product_id)
    }
}
