//! HTTP client for the DevSync REST API.
//!
//! Every call is relative to the configured base URL (origin plus `/api/v1`).
//! Authenticated calls carry the stored access token; a 401 triggers exactly
//! one token refresh and one replay of the original request.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::auth::models::{RefreshRequest, RefreshResponse};
use crate::auth::tokens::TokenStore;

/// Per-request options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Attach the bearer token and refresh on 401
    pub authenticated: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { authenticated: true }
    }
}

impl RequestOptions {
    pub fn public() -> Self {
        Self { authenticated: false }
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    /// Serializes refreshes so concurrent 401s share one refresh call
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url, tokens))
    }

    pub fn with_client(http: Client, base_url: &str, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a request and decode the JSON body into `T`.
    ///
    /// A 204 (or empty) body decodes from `null`, so use `()`, `Option<_>` or
    /// `serde_json::Value` for endpoints that return no content.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        let sent_token = if options.authenticated {
            self.tokens.get_access_token()
        } else {
            None
        };

        let mut response = self.send(&method, &url, body, sent_token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED && options.authenticated {
            debug!(%method, %url, "Request unauthorized, attempting token refresh");
            if let Some(access) = self.refresh_access_token(sent_token.as_deref()).await {
                response = self.send(&method, &url, body, Some(&access)).await?;
            }
        }

        Self::decode(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, endpoint, None, RequestOptions::default()).await
    }

    pub async fn get_public<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, endpoint, None, RequestOptions::public()).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), RequestOptions::default()).await
    }

    pub async fn post_public<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), RequestOptions::public()).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body), RequestOptions::default()).await
    }

    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, endpoint, Some(body), RequestOptions::default()).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, endpoint, None, RequestOptions::default()).await
    }

    async fn send<B>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        access_token: Option<&str>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                Value::Null
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => value,
                    Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
                    Err(_) => Value::Null,
                }
            }
        };

        if !status.is_success() {
            let error = ApiError::from_response(status, &body);
            debug!(%status, error = %error, "Request failed");
            return Err(error);
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Obtain a fresh access token after `stale` was rejected.
    ///
    /// Returns `None` when the session cannot be refreshed; stored tokens are
    /// cleared in that case.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while this one waited on the lock
        if let Some(current) = self.tokens.get_access_token() {
            if stale != Some(current.as_str()) {
                debug!("Access token already refreshed by a concurrent request");
                return Some(current);
            }
        }

        let Some(refresh) = self.tokens.get_refresh_token() else {
            info!("No refresh token stored, clearing session");
            self.tokens.clear_tokens();
            return None;
        };

        match self.post_refresh(&refresh).await {
            Ok(refreshed) => {
                self.tokens.set_access_token(&refreshed.access);
                if let Some(rotated) = refreshed.refresh.as_deref() {
                    self.tokens.set_refresh_token(rotated);
                }
                info!("Access token refreshed");
                Some(refreshed.access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.tokens.clear_tokens();
                None
            }
        }
    }

    async fn post_refresh(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        let url = self.url(endpoints::TOKEN_REFRESH);
        let response = self
            .send(&Method::POST, &url, Some(&RefreshRequest { refresh }), None)
            .await?;
        Self::decode(response).await
    }
}
