//! Aurum Core - Shared types library.
//!
//! This crate provides common types used across all Aurum components:
//! - `storefront` - Client library for the storefront API (cart, wishlist, catalog)
//! - `cli` - Command-line front end for the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, products and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
