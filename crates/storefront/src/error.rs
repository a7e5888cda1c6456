//! Unified error handling with Sentry integration.
//!
//! Store operations report failures to the shopper as notifications and
//! return plain results. `AppError` is for callers that drive the library
//! (the CLI): it unifies the per-boundary errors and decides which ones are
//! worth capturing to Sentry.

use aurum_core::EmailError;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Storefront API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Malformed email address.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation needs a signed-in shopper.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error points at a fault rather than user input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) => true,
            Self::Api(err) => matches!(
                err,
                ApiError::Http(_) | ApiError::Parse(_) | ApiError::UnexpectedResponse(_)
            ),
            _ => false,
        }
    }

    /// Log the error, capturing internal ones to Sentry.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::warn!(error = %self, "Command failed");
        }
    }

    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Storage(_) => "Could not save your changes. Please try again.".to_string(),
            Self::Config(_) => "The storefront is not configured correctly.".to_string(),
            Self::Email(_) => "Invalid email address".to_string(),
            Self::Unauthorized(_) => "Please log in to continue".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
