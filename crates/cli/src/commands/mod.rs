//! Cart commands.
//!
//! Each command opens the cart from local storage, performs one operation
//! through the cart store and prints the result.

mod view;

use rocketshoes_cart::{
    CartConfig, CartError, CartStore, ConfigError, FileStorage, HttpInventory, InventoryError,
    UpdateProductAmount,
};
use rocketshoes_core::{CurrencyCode, ProductId};
use thiserror::Error;

pub use view::{ConsoleNotifier, render_cart};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inventory client could not be created.
    #[error("Inventory client error: {0}")]
    Inventory(#[from] InventoryError),

    /// The cart operation was rejected.
    #[error("{0}")]
    Cart(#[from] CartError),
}

type LocalCartStore = CartStore<HttpInventory, FileStorage, ConsoleNotifier>;

/// A cart store wired to the configured catalog API and storage file.
pub struct Session {
    store: LocalCartStore,
    currency: CurrencyCode,
}

impl Session {
    /// Load configuration and restore the saved cart.
    pub fn open() -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        tracing::debug!(?config, "Loaded configuration");

        let store = CartStore::with_key(
            HttpInventory::new(&config.inventory)?,
            FileStorage::new(&config.storage_path),
            ConsoleNotifier,
            config.storage_key.clone(),
        );

        Ok(Self {
            store,
            currency: config.currency,
        })
    }

    /// Print the cart.
    pub async fn show(&self) {
        view::print(&render_cart(&self.store.cart().await, self.currency));
    }

    /// Add one unit of a product, then print the cart.
    pub async fn add(&self, product_id: ProductId) -> Result<(), CartError> {
        self.store.add_product(product_id).await?;
        self.show().await;
        Ok(())
    }

    /// Remove a product, then print the cart.
    pub async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        self.store.remove_product(product_id).await?;
        self.show().await;
        Ok(())
    }

    /// Set a product's amount, then print the cart.
    pub async fn update(&self, product_id: ProductId, amount: i64) -> Result<(), CartError> {
        self.store
            .update_product_amount(UpdateProductAmount { product_id, amount })
            .await?;
        self.show().await;
        Ok(())
    }
}
