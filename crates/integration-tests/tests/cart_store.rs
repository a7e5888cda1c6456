//! Cart store scenarios: merging, clamping, totals and persistence.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use aurum_integration_tests::fakes::FlakyStorage;
use aurum_integration_tests::fixtures::{discounted, pid, product, product_with_stock};
use aurum_storefront::cart::{CART_STORAGE_KEY, CartLine, CartStore};
use aurum_storefront::notify::{Notification, NotificationQueue, Severity};
use aurum_storefront::storage::{FileStorage, MemoryStorage};
use rust_decimal::Decimal;

fn cart() -> CartStore<FlakyStorage, NotificationQueue> {
    CartStore::load(FlakyStorage::new(), NotificationQueue::new())
}

#[test]
fn test_repeated_adds_merge_into_one_line() {
    let queue = NotificationQueue::new();
    let mut cart = CartStore::load(MemoryStorage::new(), queue.clone());
    let ring = product(1, "Ring", "999");

    cart.add_to_cart(&ring, 1).unwrap();
    cart.add_to_cart(&ring, 2).unwrap();

    assert_eq!(cart.lines().len(), 1);
    let line = cart.cart_item(pid(1)).unwrap();
    assert_eq!(line.quantity, 3);
    assert_eq!(line.unit_price, Decimal::from(999));
    assert_eq!(
        queue.drain(),
        vec![
            Notification::success("Ring added to cart"),
            Notification::success("Ring quantity updated in cart"),
        ]
    );
}

#[test]
fn test_line_quantity_is_sum_of_adds_per_product() {
    let mut cart = cart();
    let products = [
        product(1, "Ring", "999"),
        product(2, "Chain", "15000"),
        product(3, "Anklet", "2500"),
    ];
    let adds: [(usize, u32); 7] = [(0, 1), (1, 4), (0, 2), (2, 1), (1, 1), (0, 5), (2, 3)];

    for &(index, quantity) in &adds {
        cart.add_to_cart(&products[index], quantity).unwrap();
    }

    assert_eq!(cart.lines().len(), products.len());
    for (index, product) in products.iter().enumerate() {
        let expected: u32 = adds
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, q)| q)
            .sum();
        assert_eq!(cart.cart_quantity(product.id), expected, "{}", product.name);
    }
    assert_eq!(cart.cart_items_count(), 17);
}

#[test]
fn test_adds_are_not_clamped_to_stock() {
    let mut cart = cart();
    let pendant = product_with_stock(4, "Pendant", "5000", 2);

    cart.add_to_cart(&pendant, 2).unwrap();
    cart.add_to_cart(&pendant, 3).unwrap();

    assert_eq!(cart.cart_quantity(pid(4)), 5);
}

#[test]
fn test_update_quantity_clamps_to_stock_at_add_time() {
    let mut cart = cart();
    cart.add_to_cart(&product_with_stock(1, "Ring", "999", 2), 1)
        .unwrap();

    cart.update_quantity(pid(1), 5).unwrap();

    assert_eq!(cart.cart_quantity(pid(1)), 2);
}

#[test]
fn test_non_positive_update_matches_remove() {
    let build = || {
        let mut cart = cart();
        cart.add_to_cart(&product(1, "Ring", "999"), 2).unwrap();
        cart.add_to_cart(&product(2, "Chain", "15000"), 1).unwrap();
        cart
    };

    for quantity in [0, -1, -40] {
        let mut updated = build();
        updated.update_quantity(pid(1), quantity).unwrap();

        let mut removed = build();
        removed.remove_from_cart(pid(1)).unwrap();

        assert_eq!(updated.lines(), removed.lines(), "quantity {quantity}");
        assert_eq!(
            updated.storage().raw(CART_STORAGE_KEY),
            removed.storage().raw(CART_STORAGE_KEY)
        );
    }
}

#[test]
fn test_total_is_sum_of_line_totals() {
    let mut cart = cart();
    cart.add_to_cart(&product(1, "Ring", "999.50"), 3).unwrap();
    cart.add_to_cart(&discounted(2, "Chain", "15000", "18000"), 2)
        .unwrap();
    cart.add_to_cart(&product(3, "Anklet", "2500"), 1).unwrap();
    cart.update_quantity(pid(3), 4).unwrap();
    cart.remove_from_cart(pid(1)).unwrap();
    cart.add_to_cart(&product(1, "Ring", "999.50"), 1).unwrap();

    let expected: Decimal = cart
        .lines()
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum();
    assert_eq!(cart.cart_total(), expected);
    assert_eq!(cart.cart_total(), "40999.50".parse::<Decimal>().unwrap());
    assert_eq!(cart.cart_savings(), Decimal::from(6000));
}

#[test]
fn test_clear_persists_empty_collection() {
    let mut cart = cart();
    cart.add_to_cart(&product(1, "Ring", "999"), 2).unwrap();

    cart.clear_cart().unwrap();

    assert_eq!(cart.cart_items_count(), 0);
    let raw = cart.storage().raw(CART_STORAGE_KEY).unwrap();
    let persisted: Vec<CartLine> = serde_json::from_str(&raw).unwrap();
    assert!(persisted.is_empty());
}

#[test]
fn test_corrupted_value_loads_empty() {
    for corrupted in ["{not json", r#"{"productId": 1}"#, r#"[{"productId": "x"}]"#, ""] {
        let storage = FlakyStorage::new();
        storage.seed(CART_STORAGE_KEY, corrupted);

        let cart = CartStore::load(storage, NotificationQueue::new());

        assert!(cart.is_empty(), "{corrupted:?}");
        assert_eq!(cart.cart_total(), Decimal::ZERO);
    }
}

#[test]
fn test_cart_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let mut cart = CartStore::load(
        FileStorage::open(dir.path()).unwrap(),
        NotificationQueue::new(),
    );
    cart.add_to_cart(&product(1, "Ring", "999"), 2).unwrap();
    cart.add_to_cart(&product(2, "Chain", "15000"), 1).unwrap();
    drop(cart);

    let restored = CartStore::load(
        FileStorage::open(dir.path()).unwrap(),
        NotificationQueue::new(),
    );
    assert_eq!(restored.cart_items_count(), 3);
    assert_eq!(restored.cart_total(), Decimal::from(16_998));
    assert_eq!(restored.lines()[0].slug, "ring");
}

#[test]
fn test_failed_write_keeps_previous_cart() {
    let queue = NotificationQueue::new();
    let storage = FlakyStorage::new();
    let mut cart = CartStore::load(storage.clone(), queue.clone());
    cart.add_to_cart(&product(1, "Ring", "999"), 1).unwrap();
    let before = cart.lines().to_vec();
    let persisted = storage.raw(CART_STORAGE_KEY);
    queue.drain();

    storage.break_writes();
    assert!(cart.add_to_cart(&product(2, "Chain", "15000"), 1).is_err());
    assert!(cart.update_quantity(pid(1), 3).is_err());
    assert!(cart.clear_cart().is_err());

    assert_eq!(cart.lines(), before.as_slice());
    assert_eq!(storage.raw(CART_STORAGE_KEY), persisted);
    let notes = queue.drain();
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|n| n.severity == Severity::Error));
}
