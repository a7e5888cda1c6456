//! Aurum storefront client library.
//!
//! The client-side core of the Aurum jewellery storefront: a locally
//! persisted cart, a server-backed wishlist, and the API client and helpers
//! a front end needs around them.
//!
//! # Modules
//!
//! - [`cart`] - Cart store with durable local persistence
//! - [`wishlist`] - Wishlist store over the remote API
//! - [`api`] - HTTP client for the storefront API
//! - [`state`] - [`Storefront`](state::Storefront), wiring the stores together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod offers;
pub mod session;
pub mod state;
pub mod storage;
pub mod wishlist;

pub use error::{AppError, Result};
pub use state::{Storefront, StorefrontParts};
