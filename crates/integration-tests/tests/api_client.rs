//! The real HTTP client against a local server: wire shapes, auth, errors.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use aurum_core::{Email, OrderStatus};
use aurum_integration_tests::fixtures::pid;
use aurum_integration_tests::server::TestServer;
use aurum_storefront::api::{ApiError, ProductQuery};
use aurum_storefront::notify::{Notification, NotificationQueue};
use aurum_storefront::session::BearerAuth;
use aurum_storefront::wishlist::{WishlistApi, WishlistStore};
use rust_decimal::Decimal;
use secrecy::SecretString;

#[tokio::test]
async fn test_wishlist_shapes_normalize_identically() {
    let bare = TestServer::start().await;
    bare.respond("GET", "/wishlist", 200, r#"[{"id": 7}, {"product": {"id": "8"}}]"#);

    let enveloped = TestServer::start().await;
    enveloped.respond(
        "GET",
        "/wishlist",
        200,
        r#"{"success": true, "data": [{"id": 7}, {"product": {"id": "8"}}]}"#,
    );

    let other = TestServer::start().await;
    other.respond("GET", "/wishlist", 200, r#"{"items": [{"id": 7}]}"#);

    let from_bare = bare.client().list_wishlist().await.unwrap();
    let from_enveloped = enveloped.client().list_wishlist().await.unwrap();
    assert_eq!(from_bare, from_enveloped);
    assert_eq!(from_bare.len(), 2);

    assert!(other.client().list_wishlist().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_string_and_numeric_ids_both_match() {
    let server = TestServer::start().await;
    server.respond(
        "GET",
        "/wishlist",
        200,
        r#"{"data": [{"id": "7"}, {"id": 100, "product": {"id": 8, "name": "Jhumka"}}]}"#,
    );

    let mut store = WishlistStore::new(server.client(), NotificationQueue::new());
    store.set_authenticated(true);
    store.ensure_loaded().await;

    assert!(store.is_in_wishlist(pid(7)));
    assert!(store.is_in_wishlist(pid(8)));
    assert!(!store.is_in_wishlist(pid(9)));
    assert_eq!(store.wishlist_count(), 2);
}

#[tokio::test]
async fn test_toggle_over_http() {
    let server = TestServer::start().await;
    server.respond("GET", "/wishlist/check/5", 200, r#"{"inWishlist": false}"#);
    server.respond("POST", "/wishlist", 201, r#"{"success": true}"#);
    server.respond("GET", "/wishlist", 200, r#"[{"productId": 5, "product": {"id": 5}}]"#);

    let client = server.client();
    client.set_bearer(Some(SecretString::from("tok-123")));
    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(client, queue.clone());
    store.set_authenticated(true);

    store.toggle_wishlist(pid(5)).await;

    assert_eq!(
        server.request_lines(),
        vec![
            "GET /v1/wishlist/check/5",
            "POST /v1/wishlist",
            "GET /v1/wishlist"
        ]
    );
    let requests = server.requests();
    assert!(
        requests
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer tok-123"))
    );
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(body, serde_json::json!({"productId": 5}));
    assert!(store.is_in_wishlist(pid(5)));
    assert_eq!(queue.drain(), vec![Notification::success("Added to wishlist")]);
}

#[tokio::test]
async fn test_already_present_message_is_silenced_over_http() {
    let server = TestServer::start().await;
    server.respond(
        "POST",
        "/wishlist",
        400,
        r#"{"success": false, "message": "Product already in wishlist"}"#,
    );
    server.respond("GET", "/wishlist", 200, r#"{"data": [{"id": 3}]}"#);

    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(server.client(), queue.clone());
    store.set_authenticated(true);

    store.add_to_wishlist(pid(3)).await;

    assert!(queue.is_empty());
    assert!(store.is_in_wishlist(pid(3)));
}

#[tokio::test]
async fn test_error_body_message_reaches_notification() {
    let server = TestServer::start().await;
    server.respond("DELETE", "/wishlist/3", 400, r#"{"error": "Wishlist is locked"}"#);

    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(server.client(), queue.clone());
    store.set_authenticated(true);

    store.remove_from_wishlist(pid(3)).await;

    assert_eq!(queue.drain(), vec![Notification::error("Wishlist is locked")]);
}

#[tokio::test]
async fn test_status_mapping() {
    let server = TestServer::start().await;
    server.respond("GET", "/auth/me", 401, r#"{"message": "Token expired"}"#);
    server.respond("GET", "/products/missing", 404, "");

    let client = server.client();
    assert!(matches!(
        client.current_user().await,
        Err(ApiError::Unauthorized(Some(m))) if m == "Token expired"
    ));
    assert!(matches!(
        client.product_by_slug("missing").await,
        Err(ApiError::NotFound(None))
    ));
}

#[tokio::test]
async fn test_not_found_body_message_reaches_wishlist() {
    let server = TestServer::start().await;
    server.respond(
        "DELETE",
        "/wishlist/3",
        404,
        r#"{"message": "Item not found in wishlist"}"#,
    );
    server.respond("POST", "/wishlist", 404, r#"{"message": "Product already removed"}"#);
    server.respond("GET", "/wishlist", 200, "[]");

    let queue = NotificationQueue::new();
    let mut store = WishlistStore::new(server.client(), queue.clone());
    store.set_authenticated(true);

    store.remove_from_wishlist(pid(3)).await;
    assert_eq!(
        queue.drain(),
        vec![Notification::error("Item not found in wishlist")]
    );

    store.add_to_wishlist(pid(4)).await;
    assert!(queue.is_empty());
    assert_eq!(
        server.request_lines(),
        vec![
            "DELETE /v1/wishlist/3",
            "POST /v1/wishlist",
            "GET /v1/wishlist"
        ]
    );
}

#[tokio::test]
async fn test_products_are_cached() {
    let server = TestServer::start().await;
    server.respond(
        "GET",
        "/products?category=rings&limit=2",
        200,
        r#"{"data": [
            {"id": 1, "name": "Solitaire Ring", "slug": "solitaire-ring", "price": "85000"},
            {"id": 2, "name": "Plain Band", "slug": "plain-band", "price": 12000, "stock": 0}
        ]}"#,
    );

    let client = server.client();
    let query = ProductQuery {
        category: Some("rings".to_string()),
        limit: Some(2),
        ..Default::default()
    };

    let first = client.list_products(&query).await.unwrap();
    let second = client.list_products(&query).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(!first[1].in_stock());
    assert_eq!(server.requests().len(), 1);

    client.invalidate_catalog();
    client.list_products(&query).await.unwrap();
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_login_and_orders() {
    let server = TestServer::start().await;
    server.respond(
        "POST",
        "/auth/login",
        200,
        r#"{"data": {"accessToken": "fresh", "expiresIn": 3600,
            "user": {"id": 42, "name": "Meera Iyer", "email": "meera@example.com"}}}"#,
    );
    server.respond(
        "GET",
        "/orders",
        200,
        r#"[
            {"id": 1, "orderNumber": "AUR-1001", "status": "delivered", "total": "12000",
             "createdAt": "2026-01-10T10:00:00Z"},
            {"id": 2, "orderNumber": "AUR-1002", "status": "shipped", "total": 45999,
             "cashbackEarned": "2299.95", "createdAt": "2026-03-02T09:30:00Z"}
        ]"#,
    );

    let client = server.client();
    let email = Email::parse("meera@example.com").unwrap();
    let (token, user) = client
        .login(&email, &SecretString::from("hunter22"))
        .await
        .unwrap();
    assert!(!token.is_expired());
    assert_eq!(user.unwrap().name.as_deref(), Some("Meera Iyer"));

    let login_body: serde_json::Value =
        serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(login_body["email"], "meera@example.com");

    client.set_bearer(Some(token.secret()));
    let orders = client.orders().await.unwrap();
    assert_eq!(orders[0].display_number(), "AUR-1002");
    assert_eq!(orders[0].status, OrderStatus::Shipped);
    assert_eq!(
        orders[0].cashback_earned,
        Some("2299.95".parse::<Decimal>().unwrap())
    );
    assert_eq!(
        server.requests()[1].authorization.as_deref(),
        Some("Bearer fresh")
    );
}
