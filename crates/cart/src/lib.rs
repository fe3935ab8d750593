//! RocketShoes Cart - client-side shopping cart state.
//!
//! Holds the cart in memory, validates every change against live stock and
//! mirrors every accepted change to local storage.
//!
//! # Architecture
//!
//! [`CartStore`] is the only component with behavior. It is generic over
//! three collaborators so each can be swapped independently:
//!
//! - [`Inventory`] - product details and stock levels ([`HttpInventory`], [`MemoryInventory`])
//! - [`CartStorage`] - key-value snapshot storage ([`FileStorage`], [`MemoryStorage`])
//! - [`Notifier`] - success/error notices for the UI ([`TracingNotifier`], [`RecordingNotifier`])
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartStore, FileStorage, HttpInventory, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let store = CartStore::with_key(
//!     HttpInventory::new(&config.inventory)?,
//!     FileStorage::new(&config.storage_path),
//!     TracingNotifier,
//!     config.storage_key.clone(),
//! );
//!
//! store.add_product(ProductId::new(1)).await?;
//! store.update_product_amount(UpdateProductAmount { product_id: ProductId::new(1), amount: 3 }).await?;
//! store.remove_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod inventory;
pub mod notifier;
pub mod storage;
pub mod store;

pub use cart::{Cart, CartDataError, CartItem};
pub use config::{CartConfig, ConfigError, InventoryConfig};
pub use error::{CartError, CartErrorKind};
pub use inventory::{HttpInventory, Inventory, InventoryError, MemoryInventory};
pub use notifier::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{CartStorage, DEFAULT_CART_KEY, FileStorage, MemoryStorage, StorageError};
pub use store::{CartStore, UpdateProductAmount};
