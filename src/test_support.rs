//! Helpers shared by the in-crate tests: an in-process axum backend and
//! clients pointed at it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::api::ApiClient;
use crate::auth::TokenStore;
use crate::storage::MemoryStore;

/// Serve `router` on an ephemeral port and return its `/api/v1` base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

/// A base URL on a port nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v1", addr)
}

pub fn client_for(base_url: &str, tokens: TokenStore) -> ApiClient {
    ApiClient::new(base_url, tokens, Duration::from_secs(5)).unwrap()
}

pub fn memory_tokens() -> (Arc<MemoryStore>, TokenStore) {
    let storage = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(storage.clone());
    (storage, tokens)
}
