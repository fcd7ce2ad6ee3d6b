//! # DevSync Client
//!
//! Client-side session and notification layer for the DevSync developer
//! portfolio service.
//!
//! ## Features
//! - Persisted access/refresh token pair behind a pluggable key-value store
//! - Token-aware REST client with single-flight refresh on 401
//! - Explicit auth session handle with an observable state machine
//! - Bounded notification history with a reconnecting WebSocket feed
//!
//! ## Architecture
//! - `storage`: key-value persistence (`MemoryStore`, `FileStore`)
//! - `auth`: token store, auth payloads, access-token claims
//! - `api`: HTTP client and structured errors
//! - `session`: `Unknown → Unauthenticated ⇄ Authenticated` session
//! - `notifications`: history, desktop surface, push channel, backoff
//! - `config`: environment configuration
//!
//! ## Wiring
//! ```no_run
//! use std::sync::Arc;
//! use devsync_client::{api::ApiClient, auth::TokenStore, config::Config, session::AuthSession, storage::FileStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let storage = Arc::new(FileStore::open(&config.storage_path)?);
//! let api = Arc::new(ApiClient::new(&config.api_base_url, TokenStore::new(storage), config.http_timeout)?);
//! let session = Arc::new(AuthSession::new(api));
//! session.initialize().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod notifications;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
