//! Wishlist store scenarios against an in-memory API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use aurum_integration_tests::fakes::FakeWishlistApi;
use aurum_integration_tests::fixtures::pid;
use aurum_storefront::api::ApiError;
use aurum_storefront::notify::{Notification, NotificationQueue, Severity};
use aurum_storefront::wishlist::{LOGIN_REQUIRED_MESSAGE, WishlistStore};

fn signed_in(
    api: &FakeWishlistApi,
) -> (WishlistStore<FakeWishlistApi, NotificationQueue>, NotificationQueue) {
    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(api.clone(), queue.clone());
    store.set_authenticated(true);
    (store, queue)
}

#[tokio::test]
async fn test_signed_out_never_reports_membership() {
    let api = FakeWishlistApi::with_saved(&[1, 2, 3]);
    let (mut store, _queue) = signed_in(&api);
    store.ensure_loaded().await;
    assert!(store.is_in_wishlist(pid(2)));

    store.set_authenticated(false);

    for id in [1, 2, 3, 4] {
        assert!(!store.is_in_wishlist(pid(id)));
    }
    assert_eq!(store.wishlist_count(), 0);
}

#[tokio::test]
async fn test_signed_out_mutations_prompt_login() {
    let api = FakeWishlistApi::with_saved(&[1]);
    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(api.clone(), queue.clone());

    store.toggle_wishlist(pid(1)).await;
    store.add_to_wishlist(pid(2)).await;
    store.remove_from_wishlist(pid(1)).await;

    assert!(api.calls().is_empty());
    assert_eq!(queue.drain(), vec![Notification::error(LOGIN_REQUIRED_MESSAGE); 3]);
    assert!(store.fetch_all().await.is_empty());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_toggle_absent_product_adds_it() {
    let api = FakeWishlistApi::default();
    let (mut store, queue) = signed_in(&api);
    assert!(!store.is_in_wishlist(pid(9)));

    store.toggle_wishlist(pid(9)).await;

    assert_eq!(api.calls(), vec!["check 9", "add 9", "list"]);
    assert!(store.is_in_wishlist(pid(9)));
    assert_eq!(queue.drain(), vec![Notification::success("Added to wishlist")]);
}

#[tokio::test]
async fn test_toggle_twice_restores_original_state() {
    let api = FakeWishlistApi::with_saved(&[1]);
    let (mut store, queue) = signed_in(&api);
    store.ensure_loaded().await;

    store.toggle_wishlist(pid(1)).await;
    assert!(!store.is_in_wishlist(pid(1)));
    store.toggle_wishlist(pid(1)).await;
    assert!(store.is_in_wishlist(pid(1)));

    assert_eq!(
        queue.drain(),
        vec![
            Notification::success("Removed from wishlist"),
            Notification::success("Added to wishlist"),
        ]
    );
}

#[tokio::test]
async fn test_membership_check_retry_then_fallback() {
    let api = FakeWishlistApi::with_saved(&[1]);
    let (mut store, queue) = signed_in(&api);

    // One failure: the retry sees the product and removes it.
    api.fail_checks(1);
    store.toggle_wishlist(pid(1)).await;
    assert_eq!(api.saved(), vec![]);

    // Two failures: membership is unknown, so the store adds.
    api.fail_checks(2);
    store.toggle_wishlist(pid(5)).await;
    assert_eq!(api.saved(), vec![pid(5)]);
    assert!(store.is_in_wishlist(pid(5)));

    let notes = queue.drain();
    assert!(notes.iter().all(|n| n.severity == Severity::Success));
}

#[tokio::test]
async fn test_duplicate_add_is_silenced() {
    let api = FakeWishlistApi::with_saved(&[3]);
    let (mut store, queue) = signed_in(&api);
    api.fail_next_mutation(ApiError::Api {
        status: 409,
        message: Some("Duplicate entry for product".to_string()),
    });

    store.add_to_wishlist(pid(3)).await;

    assert!(queue.is_empty());
    assert!(store.is_in_wishlist(pid(3)));
}

#[tokio::test]
async fn test_other_failures_notify_once() {
    let api = FakeWishlistApi::default();
    let (mut store, queue) = signed_in(&api);

    api.fail_next_mutation(ApiError::Api {
        status: 500,
        message: None,
    });
    store.add_to_wishlist(pid(3)).await;

    let notes = queue.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Error);
    assert_eq!(notes[0].message, "Something went wrong. Please try again.");
    assert!(!store.is_in_wishlist(pid(3)));
}

#[tokio::test]
async fn test_failed_refresh_degrades_to_not_saved() {
    let api = FakeWishlistApi::default();
    let (mut store, queue) = signed_in(&api);
    api.fail_lists(1);

    store.add_to_wishlist(pid(4)).await;

    // The add succeeded remotely but the refresh did not.
    assert_eq!(api.saved(), vec![pid(4)]);
    assert!(!store.is_in_wishlist(pid(4)));
    assert_eq!(queue.drain(), vec![Notification::success("Added to wishlist")]);

    store.ensure_loaded().await;
    assert!(store.is_in_wishlist(pid(4)));
}
