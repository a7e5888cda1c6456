//! Sign-in and sign-out across the cart and wishlist.

#![allow(clippy::unwrap_used)]

use aurum_core::CurrencyCode;
use aurum_integration_tests::fakes::{FakeWishlistApi, FlakyStorage};
use aurum_integration_tests::fixtures::{pid, product};
use aurum_storefront::config::DEFAULT_MAX_LINE_QUANTITY;
use aurum_storefront::notify::{Notification, NotificationQueue};
use aurum_storefront::session::{AUTH_STORAGE_KEY, AuthToken, BearerAuth};
use aurum_storefront::{Storefront, StorefrontParts};
use aurum_storefront::wishlist::LOGIN_REQUIRED_MESSAGE;
use rust_decimal::Decimal;

type TestStorefront = Storefront<FlakyStorage, NotificationQueue, FakeWishlistApi>;

fn storefront(storage: &FlakyStorage, api: &FakeWishlistApi) -> TestStorefront {
    Storefront::from_parts(StorefrontParts {
        cart_storage: storage.clone(),
        session_storage: storage.clone(),
        api: api.clone(),
        notifier: NotificationQueue::new(),
        currency: CurrencyCode::INR,
        max_line_quantity: DEFAULT_MAX_LINE_QUANTITY,
    })
}

#[tokio::test]
async fn test_logout_keeps_cart_and_hides_wishlist() {
    let storage = FlakyStorage::new();
    let api = FakeWishlistApi::with_saved(&[1]);
    let mut app = storefront(&storage, &api);

    app.sign_in(AuthToken::new("token-1".to_string(), Some(3600)))
        .await
        .unwrap();
    app.cart_mut()
        .add_to_cart(&product(2, "Chain", "15000"), 2)
        .unwrap();
    assert!(app.wishlist().is_in_wishlist(pid(1)));

    app.logout().unwrap();

    assert!(!app.is_authenticated());
    assert!(!app.wishlist().is_in_wishlist(pid(1)));
    assert_eq!(app.cart().cart_items_count(), 2);
    assert_eq!(app.cart().cart_total(), Decimal::from(30_000));
    assert_eq!(api.token(), None);
    assert!(storage.raw(AUTH_STORAGE_KEY).is_none());
}

#[tokio::test]
async fn test_session_restored_on_restart() {
    let storage = FlakyStorage::new();
    let api = FakeWishlistApi::with_saved(&[7]);

    let mut first = storefront(&storage, &api);
    first
        .sign_in(AuthToken::new("token-2".to_string(), None))
        .await
        .unwrap();
    first
        .cart_mut()
        .add_to_cart(&product(1, "Ring", "999"), 1)
        .unwrap();
    drop(first);

    api.set_bearer(None);
    let mut second = storefront(&storage, &api);
    assert!(second.is_authenticated());
    assert_eq!(api.token().as_deref(), Some("token-2"));
    assert_eq!(second.cart().cart_quantity(pid(1)), 1);

    // Wishlist loads lazily after a restart.
    assert!(!second.wishlist().is_in_wishlist(pid(7)));
    second.wishlist_mut().ensure_loaded().await;
    assert!(second.wishlist().is_in_wishlist(pid(7)));
}

#[tokio::test]
async fn test_sign_in_write_failure_stays_signed_out() {
    let storage = FlakyStorage::new();
    let api = FakeWishlistApi::default();
    let mut app = storefront(&storage, &api);

    storage.break_writes();
    assert!(
        app.sign_in(AuthToken::new("token-3".to_string(), None))
            .await
            .is_err()
    );

    assert!(!app.is_authenticated());
    assert!(!app.wishlist().is_authenticated());
    assert_eq!(api.token(), None);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_wishlist_signs_out_when_token_lapses() {
    let storage = FlakyStorage::new();
    let api = FakeWishlistApi::with_saved(&[1]);
    let mut app = storefront(&storage, &api);

    // Lapses two seconds after issue once the expiry buffer is applied.
    app.sign_in(AuthToken::new("short".to_string(), Some(62)))
        .await
        .unwrap();
    assert!(app.wishlist().is_in_wishlist(pid(1)));
    assert_eq!(app.wishlist().wishlist_count(), 1);

    tokio::time::sleep(std::time::Duration::from_millis(2_100)).await;

    assert!(!app.is_authenticated());
    assert!(!app.wishlist().is_in_wishlist(pid(1)));
    assert_eq!(app.wishlist().wishlist_count(), 0);

    let calls_before = api.calls().len();
    app.notifier().drain();
    app.wishlist_mut().toggle_wishlist(pid(1)).await;

    assert_eq!(api.calls().len(), calls_before);
    assert_eq!(api.token(), None);
    assert_eq!(
        app.notifier().drain(),
        vec![Notification::error(LOGIN_REQUIRED_MESSAGE)]
    );
}
