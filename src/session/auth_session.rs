//! Auth Session
//!
//! The current-user state machine built on [`ApiClient`]. One `AuthSession` is
//! created per process and handed out as an `Arc` to whatever needs it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{endpoints, ApiClient, ApiError};
use crate::auth::models::{
    ChangePasswordRequest, Credentials, ProfileUpdate, RegisterResponse, RegistrationRequest, TokenPair, User,
};
use crate::session::state::SessionState;

pub struct AuthSession {
    api: Arc<ApiClient>,
    state: watch::Sender<SessionState>,
}

impl AuthSession {
    /// A session in the `Unknown` state. Call [`initialize`](Self::initialize)
    /// to resolve it.
    pub fn new(api: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self { api, state }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receive every subsequent state transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.api.tokens().access_token_expiry()
    }

    fn transition(&self, next: SessionState) {
        debug!(authenticated = next.is_authenticated(), "Session transition");
        self.state.send_replace(next);
    }

    /// Resolve the initial state from stored tokens.
    pub async fn initialize(&self) -> SessionState {
        if !self.api.tokens().is_authenticated() {
            self.transition(SessionState::Unauthenticated);
            return self.state();
        }

        match self.api.get::<User>(endpoints::PROFILE).await {
            Ok(user) => {
                info!(user_id = user.id, email = %user.email, "Restored session");
                self.transition(SessionState::Authenticated(user));
            }
            Err(e) => {
                warn!(error = %e, "Stored session is no longer valid");
                self.api.tokens().clear_tokens();
                self.transition(SessionState::Unauthenticated);
            }
        }
        self.state()
    }

    /// Exchange credentials for tokens, then load the profile.
    ///
    /// Tokens are stored only once the login call succeeds. If the profile
    /// fetch fails afterwards the error is returned and the tokens stay set.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let pair: TokenPair = self.api.post_public(endpoints::LOGIN, credentials).await?;
        self.api.tokens().set_tokens(&pair);

        let user: User = self.api.get(endpoints::PROFILE).await?;
        info!(user_id = user.id, email = %user.email, "Logged in");
        self.transition(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Create an account. The session is not logged in afterwards.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<RegisterResponse, ApiError> {
        let response: RegisterResponse = self.api.post_public(endpoints::REGISTER, request).await?;
        info!(email = %response.user.email, "Registered account");
        Ok(response)
    }

    /// Invalidate the refresh token server-side if possible, then always drop
    /// local credentials and user state.
    pub async fn logout(&self) {
        if let Some(refresh) = self.api.tokens().get_refresh_token() {
            let body = json!({ "refresh": refresh });
            if let Err(e) = self.api.post::<Value, _>(endpoints::LOGOUT, &body).await {
                debug!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        self.api.tokens().clear_tokens();
        self.transition(SessionState::Unauthenticated);
        info!("Logged out");
    }

    /// Re-fetch the profile. Returns `None` without a request when no access
    /// token is stored.
    pub async fn refresh_user(&self) -> Result<Option<User>, ApiError> {
        if !self.api.tokens().is_authenticated() {
            return Ok(None);
        }

        let user: User = self.api.get(endpoints::PROFILE).await?;
        self.transition(SessionState::Authenticated(user.clone()));
        Ok(Some(user))
    }

    pub async fn update_profile(&self, changes: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.api.patch(endpoints::PROFILE, changes).await?;
        info!(user_id = user.id, "Profile updated");
        self.transition(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ApiError> {
        let _: Value = self.api.post(endpoints::CHANGE_PASSWORD, request).await?;
        info!("Password changed");
        Ok(())
    }
}
