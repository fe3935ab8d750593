//! End-to-end tests: cart store against the HTTP catalog client and file storage.
//!
//! A mock catalog API runs in-process, so these tests need no external services.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use rocketshoes_cart::{
    Cart, CartConfig, CartError, CartErrorKind, CartStorage, CartStore, FileStorage,
    HttpInventory, Inventory, InventoryError, Notice, RecordingNotifier, UpdateProductAmount,
};
use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::{MockCatalog, sneaker};
use tempfile::TempDir;

type HttpCartStore = CartStore<HttpInventory, FileStorage, Arc<RecordingNotifier>>;

fn config(catalog: &MockCatalog, scratch: &TempDir, extra: &[(&str, &str)]) -> CartConfig {
    let storage_path = scratch.path().join("storage.json");
    let storage_path = storage_path.to_str().unwrap().to_string();
    let base_url = catalog.base_url().to_string();

    let mut vars: Vec<(String, String)> = vec![
        ("INVENTORY_API_URL".to_string(), base_url),
        ("CART_STORAGE_PATH".to_string(), storage_path),
    ];
    vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));

    CartConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

fn open_store(config: &CartConfig, notifier: &Arc<RecordingNotifier>) -> HttpCartStore {
    CartStore::with_key(
        HttpInventory::new(&config.inventory).unwrap(),
        FileStorage::new(&config.storage_path),
        Arc::clone(notifier),
        config.storage_key.clone(),
    )
}

/// Cart as currently written to disk.
fn saved_cart(config: &CartConfig) -> Cart {
    let raw = FileStorage::new(&config.storage_path)
        .get(&config.storage_key)
        .unwrap()
        .expect("no cart saved");
    serde_json::from_str(&raw).unwrap()
}

fn amounts(cart: &Cart) -> Vec<(i32, u32)> {
    cart.iter()
        .map(|item| (item.id().as_i32(), item.amount))
        .collect()
}

async fn catalog() -> MockCatalog {
    let catalog = MockCatalog::start().await;
    catalog.insert(sneaker(1, "Tênis de Caminhada Leve Confortável", 17_990), 3);
    catalog.insert(sneaker(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 13_990), 5);
    catalog.insert(sneaker(3, "Tênis Adidas Duramo Lite 2.0", 21_990), 0);
    catalog
}

// =============================================================================
// HttpInventory
// =============================================================================

#[tokio::test]
async fn test_http_inventory_fetches_product_and_stock() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let inventory = HttpInventory::new(&config(&catalog, &scratch, &[]).inventory).unwrap();

    let product = inventory.product(ProductId::new(2)).await.unwrap();
    assert_eq!(product, sneaker(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 13_990));

    let stock = inventory.stock(ProductId::new(2)).await.unwrap();
    assert_eq!(stock.id, ProductId::new(2));
    assert_eq!(stock.amount, 5);
}

#[tokio::test]
async fn test_http_inventory_not_found() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let inventory = HttpInventory::new(&config(&catalog, &scratch, &[]).inventory).unwrap();

    let err = inventory.product(ProductId::new(404)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(id) if id == ProductId::new(404)));

    let err = inventory.stock(ProductId::new(404)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
}

#[tokio::test]
async fn test_http_inventory_server_error() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let inventory = HttpInventory::new(&config(&catalog, &scratch, &[]).inventory).unwrap();
    catalog.set_failing(true);

    let err = inventory.stock(ProductId::new(1)).await.unwrap_err();
    match err {
        InventoryError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "catalog exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_inventory_caches_products_but_not_stock() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let inventory = HttpInventory::new(&config(&catalog, &scratch, &[]).inventory).unwrap();

    for _ in 0..3 {
        inventory.product(ProductId::new(1)).await.unwrap();
        inventory.stock(ProductId::new(1)).await.unwrap();
    }
    assert_eq!(catalog.product_hits(), 1);
    assert_eq!(catalog.stock_hits(), 3);

    inventory.invalidate_product(ProductId::new(1)).await;
    inventory.product(ProductId::new(1)).await.unwrap();
    assert_eq!(catalog.product_hits(), 2);
}

#[tokio::test]
async fn test_http_inventory_sends_bearer_token() {
    let catalog = catalog().await;
    catalog.require_token("tok_Zx81mQp4Lr");
    let scratch = tempfile::tempdir().unwrap();

    let anonymous = HttpInventory::new(&config(&catalog, &scratch, &[]).inventory).unwrap();
    let err = anonymous.stock(ProductId::new(1)).await.unwrap_err();
    assert!(matches!(err, InventoryError::Status { status: 401, .. }));

    let authorized = HttpInventory::new(
        &config(&catalog, &scratch, &[("INVENTORY_API_TOKEN", "tok_Zx81mQp4Lr")]).inventory,
    )
    .unwrap();
    assert_eq!(authorized.stock(ProductId::new(1)).await.unwrap().amount, 3);
}

#[tokio::test]
async fn test_http_inventory_timeout() {
    let catalog = catalog().await;
    catalog.set_delay(Some(Duration::from_secs(2)));
    let scratch = tempfile::tempdir().unwrap();
    let inventory = HttpInventory::new(
        &config(&catalog, &scratch, &[("INVENTORY_TIMEOUT_SECS", "1")]).inventory,
    )
    .unwrap();

    let err = inventory.stock(ProductId::new(1)).await.unwrap_err();
    assert!(matches!(err, InventoryError::Http(ref e) if e.is_timeout()), "{err:?}");
}

// =============================================================================
// CartStore end to end
// =============================================================================

#[tokio::test]
async fn test_scenario_add_add_invalid_update_remove() {
    let catalog = MockCatalog::start().await;
    catalog.insert(sneaker(1, "Tênis de Caminhada Leve Confortável", 17_990), 5);
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = open_store(&config, &notifier);

    store.add_product(ProductId::new(1)).await.unwrap();
    assert_eq!(amounts(&store.cart().await), vec![(1, 1)]);
    assert_eq!(saved_cart(&config), store.cart().await);

    store.add_product(ProductId::new(1)).await.unwrap();
    assert_eq!(amounts(&store.cart().await), vec![(1, 2)]);
    assert_eq!(saved_cart(&config), store.cart().await);

    let err = store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(1),
            amount: 0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::InvalidQuantity);
    assert_eq!(amounts(&store.cart().await), vec![(1, 2)]);

    store.remove_product(ProductId::new(1)).await.unwrap();
    assert!(store.cart().await.is_empty());
    assert!(saved_cart(&config).is_empty());

    assert_eq!(
        notifier.notices(),
        vec![
            Notice::ProductAdded,
            Notice::ProductAdded,
            Notice::InvalidQuantity
        ]
    );
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    let notifier = Arc::new(RecordingNotifier::new());

    {
        let store = open_store(&config, &notifier);
        store.add_product(ProductId::new(2)).await.unwrap();
        store.add_product(ProductId::new(1)).await.unwrap();
        store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(2),
                amount: 4,
            })
            .await
            .unwrap();
    }

    let reopened = open_store(&config, &notifier);
    let cart = reopened.cart().await;
    assert_eq!(amounts(&cart), vec![(2, 4), (1, 1)]);
    assert_eq!(
        cart.get(ProductId::new(2)).unwrap().product.title,
        "Tênis VR Caminhada Confortável Detalhes Couro Masculino"
    );
    assert_eq!(
        cart.subtotal(config.currency).to_string(),
        "R$739.50"
    );
}

#[tokio::test]
async fn test_stock_limits_enforced_against_live_catalog() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = open_store(&config, &notifier);

    // Out of stock from the start.
    let err = store.add_product(ProductId::new(3)).await.unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::OutOfStock);

    // Stock 3: the fourth add is refused.
    for _ in 0..3 {
        store.add_product(ProductId::new(1)).await.unwrap();
    }
    assert!(store.add_product(ProductId::new(1)).await.is_err());

    // Stock drops behind the cart's back; an update above it is refused.
    catalog.set_stock(ProductId::new(1), 2);
    let err = store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(1),
            amount: 3,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartError::OutOfStock {
            requested: 3,
            available: 2,
            ..
        }
    ));

    assert_eq!(amounts(&store.cart().await), vec![(1, 3)]);
    assert_eq!(saved_cart(&config), store.cart().await);
    assert_eq!(
        notifier.notices(),
        vec![
            Notice::StockExceeded,
            Notice::ProductAdded,
            Notice::ProductAdded,
            Notice::ProductAdded,
            Notice::StockExceeded,
            Notice::StockExceeded
        ]
    );
}

#[tokio::test]
async fn test_catalog_outage_leaves_cart_unchanged() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = open_store(&config, &notifier);

    store.add_product(ProductId::new(1)).await.unwrap();
    catalog.set_failing(true);
    notifier.take();

    assert!(store.add_product(ProductId::new(2)).await.unwrap_err().is_service_failure());
    assert!(
        store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 2,
            })
            .await
            .unwrap_err()
            .is_service_failure()
    );

    assert_eq!(amounts(&store.cart().await), vec![(1, 1)]);
    assert_eq!(amounts(&saved_cart(&config)), vec![(1, 1)]);
    assert_eq!(notifier.notices(), vec![Notice::AddFailed, Notice::UpdateFailed]);

    // Removal needs no catalog and still works during the outage.
    store.remove_product(ProductId::new(1)).await.unwrap();
    assert!(saved_cart(&config).is_empty());
}

#[tokio::test]
async fn test_corrupt_storage_file_starts_empty() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    std::fs::write(
        &config.storage_path,
        r#"{"@RocketShoes:cart": "[{\"id\": 1, \"amount\": \"lots\"}]"}"#,
    )
    .unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let store = open_store(&config, &notifier);
    assert!(store.cart().await.is_empty());

    store.add_product(ProductId::new(2)).await.unwrap();
    assert_eq!(amounts(&saved_cart(&config)), vec![(2, 1)]);
}

#[tokio::test]
async fn test_unparseable_storage_file_is_replaced_on_first_write() {
    let catalog = catalog().await;
    let scratch = tempfile::tempdir().unwrap();
    let config = config(&catalog, &scratch, &[]);
    std::fs::write(&config.storage_path, "{not json").unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let store = open_store(&config, &notifier);
    assert!(store.cart().await.is_empty());

    store.add_product(ProductId::new(2)).await.unwrap();
    store.add_product(ProductId::new(2)).await.unwrap();

    assert_eq!(amounts(&store.cart().await), vec![(2, 2)]);
    assert_eq!(amounts(&saved_cart(&config)), vec![(2, 2)]);
    assert_eq!(notifier.notices(), vec![Notice::ProductAdded, Notice::ProductAdded]);

    // A restart picks up the repaired file.
    let reopened = open_store(&config, &notifier);
    assert_eq!(amounts(&reopened.cart().await), vec![(2, 2)]);
}
