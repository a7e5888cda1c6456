//! HTTP client for the Aurum storefront API.
//!
//! # Architecture
//!
//! - `reqwest` with a per-request timeout from configuration
//! - The API is the source of truth; the client holds no state besides the
//!   bearer token and a short-lived catalog cache (`moka`, 5 minute TTL)
//! - Response shapes are normalized in [`conversions`] before they are
//!   returned
//!
//! # Example
//!
//! ```rust,ignore
//! use aurum_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.product_by_slug("kundan-choker").await?;
//!
//! client.set_token(Some(token.secret()));
//! client.add_to_wishlist(product.id).await?;
//! ```

mod cache;
pub(crate) mod conversions;
pub mod types;

pub use types::{Address, AddressInput, Order, OrderLine, ProductQuery, User};

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use aurum_core::{AddressId, Email, Product, ProductId};
use moka::future::Cache;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::offers::CashbackOffer;
use crate::session::{AuthToken, BearerAuth};
use crate::wishlist::{WishlistApi, WishlistEntry};

use cache::{CacheKey, CacheValue};
use types::{LoginRequest, LoginResponse};

/// Fallback shown when an error carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status}{}", .message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Missing or rejected bearer token.
    #[error("Unauthorized{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized(Option<String>),

    /// Resource not found.
    #[error("Not found{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    NotFound(Option<String>),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message extracted from the error body, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::Unauthorized(message) | Self::NotFound(message) => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Message suitable for a notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(None) => "Please log in to continue".to_string(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".to_string(),
            _ => self
                .message()
                .map_or_else(|| GENERIC_ERROR_MESSAGE.to_string(), str::to_owned),
        }
    }

    /// Whether the API is reporting that the item is already present.
    #[must_use]
    pub fn is_already_present(&self) -> bool {
        self.message().is_some_and(|m| {
            let lower = m.to_lowercase();
            lower.contains("already") || lower.contains("duplicate")
        })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, token and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: RwLock::new(None),
                cache,
            }),
        })
    }

    /// Set or clear the bearer token sent with every request.
    pub fn set_token(&self, token: Option<SecretString>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether a bearer token is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop all cached catalog responses.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        let token = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expose_secret().to_owned());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the parsed JSON body (`Null` when empty).
    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = conversions::error_message(&body);
            tracing::warn!(
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "Storefront API returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List products matching a server-side query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Arc<Vec<Product>>, ApiError> {
        let cache_key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let body = self.execute(self.request(Method::GET, url)).await?;
        let products = Arc::new(conversions::typed_list::<Product>(body, "product"));

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(slug.to_owned());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", slug])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        let product: Product = match conversions::single_item(body) {
            Value::Null => return Err(ApiError::NotFound(Some(format!("Product not found: {slug}")))),
            value => serde_json::from_value(value)?,
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// The token is not installed on the client; see [`ApiClient::set_token`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<(AuthToken, Option<User>), ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let value = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        let response: LoginResponse = serde_json::from_value(conversions::single_item(value))?;

        let token = AuthToken::new(response.token, response.expires_in);
        Ok((token, response.user))
    }

    /// Fetch the signed-in shopper's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is missing or expired.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let url = self.endpoint(&["auth", "me"])?;
        let value = self.execute(self.request(Method::GET, url)).await?;
        let value = match conversions::single_item(value) {
            Value::Object(mut map) if matches!(map.get("user"), Some(Value::Object(_))) => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch the shopper's order history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        let mut orders = conversions::typed_list::<Order>(body, "order");
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// List saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        Ok(conversions::typed_list(body, "address"))
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the address.
    #[instrument(skip(self, address))]
    pub async fn create_address(&self, address: &AddressInput) -> Result<Address, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        let value = self
            .execute(self.request(Method::POST, url).json(address))
            .await?;
        Ok(serde_json::from_value(conversions::single_item(value))?)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        let url = self.endpoint(&["addresses", &id.to_string()])?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// List cashback offers currently advertised.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn cashback_offers(&self) -> Result<Vec<CashbackOffer>, ApiError> {
        let url = self.endpoint(&["offers", "cashback"])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        Ok(conversions::typed_list(body, "cashback offer"))
    }
}

impl BearerAuth for ApiClient {
    fn set_bearer(&self, token: Option<SecretString>) {
        self.set_token(token);
    }
}

// =============================================================================
// Wishlist Endpoints
// =============================================================================

impl WishlistApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
        let url = self.endpoint(&["wishlist"])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        Ok(conversions::wishlist_entries(body))
    }

    #[instrument(skip(self))]
    async fn add_to_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["wishlist"])?;
        let body = serde_json::json!({ "productId": product_id });
        self.execute(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["wishlist", &product_id.to_string()])?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check_wishlist(&self, product_id: ProductId) -> Result<bool, ApiError> {
        let url = self.endpoint(&["wishlist", "check", &product_id.to_string()])?;
        let body = self.execute(self.request(Method::GET, url)).await?;
        conversions::membership(&body).ok_or_else(|| {
            ApiError::UnexpectedResponse("membership response has no inWishlist flag".to_string())
        })
    }
}
