//! Cart operation errors.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::storage::StorageError;

/// Why a cart operation was rejected.
///
/// Every variant leaves the cart exactly as it was before the call.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount exceeds available stock.
    #[error(
        "Product {product_id} is out of stock (requested {requested}, available {available})"
    )]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Requested amount is below 1.
    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(i64),

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    /// Inventory lookup failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Snapshot could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Snapshot could not be encoded.
    #[error("Failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Coarse error categories, for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartErrorKind {
    OutOfStock,
    InvalidQuantity,
    ProductNotInCart,
    ServiceFailure,
}

impl CartError {
    #[must_use]
    pub const fn kind(&self) -> CartErrorKind {
        match self {
            Self::OutOfStock { .. } => CartErrorKind::OutOfStock,
            Self::InvalidQuantity(_) => CartErrorKind::InvalidQuantity,
            Self::ProductNotInCart(_) => CartErrorKind::ProductNotInCart,
            Self::Inventory(_) | Self::Storage(_) | Self::Serialize(_) => {
                CartErrorKind::ServiceFailure
            }
        }
    }

    /// Whether a collaborator (inventory, storage) failed rather than the
    /// request being refused.
    #[must_use]
    pub const fn is_service_failure(&self) -> bool {
        matches!(self.kind(), CartErrorKind::ServiceFailure)
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
