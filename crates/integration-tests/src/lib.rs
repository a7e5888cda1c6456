//! Shared fixtures for Aurum storefront integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aurum-integration-tests
//! ```
//!
//! Nothing here needs a live API: the wishlist runs against
//! [`fakes::FakeWishlistApi`], and HTTP-level tests use the local
//! [`server::TestServer`].
//!
//! # Test Categories
//!
//! - `cart_store` - Cart invariants and persistence
//! - `wishlist_store` - Wishlist authentication, toggling and error handling
//! - `storefront_session` - Sign-in and sign-out across stores
//! - `api_client` - Response normalization through the real HTTP client
//! - `offers` - Cashback calculation

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

pub mod fakes;
pub mod fixtures;
pub mod server;
