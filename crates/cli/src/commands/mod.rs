//! Command implementations.
//!
//! Each command drives the [`Storefront`] stores and writes its output to the
//! supplied writer. Shopper-facing outcomes (added, removed, failed) arrive
//! as notifications and are printed by `main` after the command returns.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod wishlist;

use std::io::{self, Write};

use aurum_core::ProductId;
use aurum_storefront::api::ApiError;
use aurum_storefront::notify::{Notification, NotificationQueue, Severity};
use aurum_storefront::storage::{FileStorage, StorageError};
use aurum_storefront::{AppError, Storefront};
use thiserror::Error;

/// The storefront as wired by the CLI.
pub type App = Storefront<FileStorage, NotificationQueue>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing command output failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        Self::App(err.into())
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        Self::App(err.into())
    }
}

impl CommandError {
    /// Log the error, capturing internal ones to Sentry.
    pub fn report(&self) {
        match self {
            Self::App(err) => err.report(),
            Self::Io(err) => tracing::error!(error = %err, "Failed to write output"),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::App(err) => err.user_message(),
            Self::Io(err) => err.to_string(),
        }
    }
}

/// Print pending notifications, one per line.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn print_notifications(out: &mut impl Write, notifications: &[Notification]) -> io::Result<()> {
    for notification in notifications {
        let marker = match notification.severity {
            Severity::Success => "✓",
            Severity::Info => "•",
            Severity::Error => "✗",
        };
        writeln!(out, "{marker} {}", notification.message)?;
    }
    Ok(())
}

/// Resolve a product argument given as a numeric id or a cart line slug.
fn resolve_cart_product(app: &App, product: &str) -> Result<ProductId, AppError> {
    if let Ok(id) = product.parse::<ProductId>() {
        return Ok(id);
    }
    app.cart()
        .lines()
        .iter()
        .find(|line| line.slug == product)
        .map(|line| line.product_id)
        .ok_or_else(|| AppError::NotFound(format!("No cart line for {product}")))
}
