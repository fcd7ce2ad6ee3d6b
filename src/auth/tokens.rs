//! Token Store
//!
//! Persists the access/refresh token pair under two fixed keys of a
//! [`KeyValueStore`]. Possession of a non-empty access token is what "logged
//! in" means on the client; expiry is only discovered when a request fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::auth::claims::peek_claims;
use crate::auth::models::TokenPair;
use crate::storage::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Handle to the persisted token pair. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage: Some(storage) }
    }

    /// A store with no backing storage. Reads return `None`, writes are dropped.
    pub fn detached() -> Self {
        Self { storage: None }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.storage
            .as_ref()?
            .get(key)
            .filter(|value| !value.is_empty())
    }

    fn write(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            storage.set(key, value);
        }
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Both tokens, or `None` if either is missing.
    pub fn token_pair(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access: self.get_access_token()?,
            refresh: self.get_refresh_token()?,
        })
    }

    pub fn set_tokens(&self, pair: &TokenPair) {
        self.write(ACCESS_TOKEN_KEY, &pair.access);
        self.write(REFRESH_TOKEN_KEY, &pair.refresh);
    }

    pub fn set_access_token(&self, access: &str) {
        self.write(ACCESS_TOKEN_KEY, access);
    }

    pub fn set_refresh_token(&self, refresh: &str) {
        self.write(REFRESH_TOKEN_KEY, refresh);
    }

    pub fn clear_tokens(&self) {
        if let Some(storage) = &self.storage {
            storage.remove(ACCESS_TOKEN_KEY);
            storage.remove(REFRESH_TOKEN_KEY);
            debug!("Cleared stored tokens");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_access_token().is_some()
    }

    /// Expiry read from the stored access token's payload, if it is a JWT.
    pub fn access_token_expiry(&self) -> Option<DateTime<Utc>> {
        let token = self.get_access_token()?;
        peek_claims(&token).ok()?.expires_at()
    }
}
