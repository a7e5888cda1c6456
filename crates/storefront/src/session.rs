//! Persisted sign-in state.
//!
//! The bearer token survives restarts under the `auth_token` storage key.
//! Everything else about the shopper is fetched from the API on demand.

use std::fmt;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{LocalStorage, StorageError};

/// Storage key holding the serialized token.
pub const AUTH_STORAGE_KEY: &str = "auth_token";

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// A bearer token and when it was issued.
#[derive(Clone)]
pub struct AuthToken {
    access_token: SecretString,
    obtained_at: i64,
    expires_in: Option<i64>,
}

impl AuthToken {
    /// Token issued now, valid for `expires_in` seconds (or indefinitely).
    #[must_use]
    pub fn new(access_token: String, expires_in: Option<i64>) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            obtained_at: Utc::now().timestamp(),
            expires_in,
        }
    }

    /// Unix timestamp from which the token counts as expired, if it expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in.map(|expires_in| {
            self.obtained_at
                .saturating_add(expires_in)
                .saturating_sub(EXPIRY_BUFFER_SECS)
        })
    }

    /// Whether the token is expired or about to expire.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| Utc::now().timestamp() >= expires_at)
    }

    /// The token, for installing on the API client.
    #[must_use]
    pub fn secret(&self) -> SecretString {
        self.access_token.clone()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"[REDACTED]")
            .field("obtained_at", &self.obtained_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A client that sends a bearer token with its requests.
pub trait BearerAuth {
    /// Install or clear the token.
    fn set_bearer(&self, token: Option<SecretString>);
}

/// On-disk form of [`AuthToken`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    access_token: String,
    obtained_at: i64,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<&AuthToken> for StoredToken {
    fn from(token: &AuthToken) -> Self {
        Self {
            access_token: token.access_token.expose_secret().to_owned(),
            obtained_at: token.obtained_at,
            expires_in: token.expires_in,
        }
    }
}

impl From<StoredToken> for AuthToken {
    fn from(stored: StoredToken) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            obtained_at: stored.obtained_at,
            expires_in: stored.expires_in,
        }
    }
}

/// Sign-in state persisted in local storage.
#[derive(Debug)]
pub struct AuthSession<S> {
    storage: S,
    token: Option<AuthToken>,
}

impl<S: LocalStorage> AuthSession<S> {
    /// Restore the session from storage.
    ///
    /// An unreadable, malformed or expired token is removed and the session
    /// starts signed out.
    pub fn load(mut storage: S) -> Self {
        let token = match storage.get(AUTH_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<StoredToken>(&raw) {
                Ok(stored) => Some(AuthToken::from(stored)),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed stored auth token");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored auth token");
                None
            }
        };

        let token = match token {
            Some(token) if token.is_expired() => {
                debug!("Stored auth token expired");
                None
            }
            other => other,
        };

        if token.is_none() {
            if let Err(e) = storage.remove(AUTH_STORAGE_KEY) {
                warn!(error = %e, "Failed to remove stale auth token");
            }
        }

        Self { storage, token }
    }

    /// Persist a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written; the session is left
    /// unchanged.
    pub fn sign_in(&mut self, token: AuthToken) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&StoredToken::from(&token))?;
        self.storage.set(AUTH_STORAGE_KEY, &raw)?;
        self.token = Some(token);
        Ok(())
    }

    /// Forget the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored token cannot be removed. The in-memory
    /// session is signed out regardless.
    pub fn sign_out(&mut self) -> Result<(), StorageError> {
        self.token = None;
        self.storage.remove(AUTH_STORAGE_KEY)
    }

    /// Whether a non-expired token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    #[must_use]
    pub const fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_token_expiry() {
        assert!(!AuthToken::new("t".into(), None).is_expired());
        assert!(!AuthToken::new("t".into(), Some(3600)).is_expired());
        // Inside the buffer window.
        assert!(AuthToken::new("t".into(), Some(30)).is_expired());

        let token = AuthToken::new("t".into(), Some(3600));
        assert_eq!(token.expires_at(), Some(token.obtained_at + 3540));
        assert_eq!(AuthToken::new("t".into(), None).expires_at(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AuthToken::new("super-secret".into(), Some(3600));
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_sign_in_survives_reload() {
        let mut session = AuthSession::load(MemoryStorage::new());
        assert!(!session.is_authenticated());

        session
            .sign_in(AuthToken::new("abc".into(), Some(3600)))
            .unwrap();
        assert!(session.is_authenticated());

        let restored = AuthSession::load(session.storage().clone());
        assert!(restored.is_authenticated());
        assert_eq!(restored.token().unwrap().secret().expose_secret(), "abc");
    }

    #[test]
    fn test_sign_out_removes_stored_token() {
        let mut session = AuthSession::load(MemoryStorage::new());
        session.sign_in(AuthToken::new("abc".into(), None)).unwrap();
        session.sign_out().unwrap();

        assert!(!session.is_authenticated());
        assert!(session.storage().get(AUTH_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_malformed_and_expired_tokens_are_dropped() {
        let storage = MemoryStorage::new().with_entry(AUTH_STORAGE_KEY, "not json");
        let session = AuthSession::load(storage);
        assert!(!session.is_authenticated());
        assert!(session.storage().get(AUTH_STORAGE_KEY).unwrap().is_none());

        let expired = r#"{"accessToken":"old","obtainedAt":0,"expiresIn":10}"#;
        let session = AuthSession::load(MemoryStorage::new().with_entry(AUTH_STORAGE_KEY, expired));
        assert!(session.token().is_none());
    }
}
