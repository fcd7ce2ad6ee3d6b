//! Access Token Claims
//!
//! Reads the payload of a SimpleJWT access token without verifying it. The
//! client never holds the signing key, so this is for display only (e.g.
//! "session expires at ..."); authentication decisions are left to the backend.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a backend-issued access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Backend user id
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Expiration, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    #[serde(default)]
    pub iat: Option<i64>,
    /// Token id (used by the backend's blacklist)
    #[serde(default)]
    pub jti: Option<String>,
    /// "access" or "refresh"
    #[serde(default)]
    pub token_type: Option<String>,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Decode the claims of `token` without checking its signature or expiry.
pub fn peek_claims(token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
}
