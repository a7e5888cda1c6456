//! Application state: the stores a storefront front end works with.
//!
//! [`Storefront`] is built once at start-up and owns the cart, the wishlist
//! and the sign-in session. Nothing is global; front ends hold a
//! `Storefront` and borrow the stores from it.

use aurum_core::{CurrencyCode, Email};
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, User};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::error::{self, AppError};
use crate::notify::Notifier;
use crate::session::{AuthSession, AuthToken, BearerAuth};
use crate::storage::{FileStorage, LocalStorage, StorageError};
use crate::wishlist::{WishlistApi, WishlistStore};

/// The cart, wishlist and session for one shopper.
pub struct Storefront<S, N, A = ApiClient> {
    cart: CartStore<S, N>,
    wishlist: WishlistStore<A, N>,
    session: AuthSession<S>,
    notifier: N,
    currency: CurrencyCode,
}

/// Collaborators for [`Storefront::from_parts`].
pub struct StorefrontParts<S, N, A> {
    /// Storage for the `cart` key.
    pub cart_storage: S,
    /// Storage for the `auth_token` key.
    pub session_storage: S,
    pub api: A,
    pub notifier: N,
    pub currency: CurrencyCode,
    pub max_line_quantity: u32,
}

impl<S, N, A> Storefront<S, N, A>
where
    S: LocalStorage,
    N: Notifier + Clone,
    A: WishlistApi + BearerAuth,
{
    /// Assemble the stores from explicit collaborators.
    ///
    /// A restored session installs its token on the API and enables the
    /// wishlist; the wishlist itself is fetched lazily.
    pub fn from_parts(parts: StorefrontParts<S, N, A>) -> Self {
        let cart = CartStore::load_with_limit(
            parts.cart_storage,
            parts.notifier.clone(),
            parts.max_line_quantity,
        );
        let session = AuthSession::load(parts.session_storage);

        parts
            .api
            .set_bearer(session.token().map(AuthToken::secret));
        let mut wishlist = WishlistStore::new(parts.api, parts.notifier.clone());
        if let Some(token) = session.token() {
            wishlist.sign_in_until(token.expires_at());
        }

        Self {
            cart,
            wishlist,
            session,
            notifier: parts.notifier,
            currency: parts.currency,
        }
    }

    /// Start a session with a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted. The API and the
    /// wishlist are left signed out in that case.
    #[instrument(skip_all)]
    pub async fn sign_in(&mut self, token: AuthToken) -> Result<(), StorageError> {
        let secret = token.secret();
        let expires_at = token.expires_at();
        self.session.sign_in(token)?;
        self.wishlist.api().set_bearer(Some(secret));
        self.wishlist.sign_in_until(expires_at);
        self.wishlist.ensure_loaded().await;
        Ok(())
    }

    /// End the session.
    ///
    /// The cart is kept. The wishlist is disabled and its cache dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored token cannot be removed. The shopper is
    /// signed out in memory regardless.
    #[instrument(skip_all)]
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.wishlist.set_authenticated(false);
        self.wishlist.api().set_bearer(None);
        error::clear_sentry_user();
        let result = self.session.sign_out();
        if let Err(e) = &result {
            warn!(error = %e, "Failed to remove stored auth token");
        }
        info!("Signed out");
        result
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S, N> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S, N> {
        &mut self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistStore<A, N> {
        &self.wishlist
    }

    /// The wishlist, signed out first if the session has lapsed.
    pub fn wishlist_mut(&mut self) -> &mut WishlistStore<A, N> {
        if self.session.token().is_some() && !self.session.is_authenticated() {
            debug!("Session expired, dropping bearer token");
            self.wishlist.set_authenticated(false);
            self.wishlist.api().set_bearer(None);
        }
        &mut self.wishlist
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession<S> {
        &self.session
    }

    /// The API shared by the wishlist and the rest of the front end.
    #[must_use]
    pub const fn api(&self) -> &A {
        self.wishlist.api()
    }

    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }
}

impl<N: Notifier + Clone> Storefront<FileStorage, N, ApiClient> {
    /// Open the storefront described by `config`.
    ///
    /// Local state lives in `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: &StorefrontConfig, notifier: N) -> Result<Self, AppError> {
        let storage = FileStorage::open(&config.data_dir)?;
        let api = ApiClient::new(&config.api)?;

        Ok(Self::from_parts(StorefrontParts {
            cart_storage: storage.clone(),
            session_storage: storage,
            api,
            notifier,
            currency: config.currency,
            max_line_quantity: config.max_line_quantity,
        }))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the token cannot
    /// be stored.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &mut self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<User>, AppError> {
        let (token, user) = self.api().login(email, password).await?;
        self.sign_in(token).await?;

        match &user {
            Some(user) => error::set_sentry_user(&user.id, Some(email.as_str())),
            None => error::set_sentry_user(&email.as_str(), Some(email.as_str())),
        }
        info!("Signed in");
        Ok(user)
    }
}
