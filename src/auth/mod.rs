//! # Authentication Module
//!
//! Client-side authentication state: the persisted token pair, the payloads of
//! the backend's auth endpoints, and unverified access-token claims.

pub mod claims;
pub mod models;
pub mod tokens;

pub use claims::{peek_claims, AccessClaims};
pub use models::{ChangePasswordRequest, Credentials, ProfileUpdate, RegisterResponse, RegistrationRequest, TokenPair, User};
pub use tokens::TokenStore;
