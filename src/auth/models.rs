//! Authentication Models
//!
//! Request and response payloads of the backend's `/auth/*` endpoints, plus
//! the user profile they return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair as issued by `POST /auth/login/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Login request payload
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration request payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Response of `POST /auth/register/`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /auth/token/refresh/`. The refresh token is only present
/// when the backend rotates refresh tokens.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Authenticated user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub github_username: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub portfolio_url: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Full name, falling back to the email address
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Partial profile update for `PATCH /auth/profile/`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.github_username.is_none()
            && self.linkedin_url.is_none()
            && self.portfolio_url.is_none()
    }
}

/// Payload for `POST /auth/change-password/`
#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_profile_deserializes() {
        let user: User = serde_json::from_value(json!({"id": 1, "email": "a@b.com"})).unwrap();
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.display_name(), "a@b.com");
        assert!(!user.is_verified);
        assert!(user.date_joined.is_none());
    }

    #[test]
    fn test_full_profile_deserializes() {
        let user: User = serde_json::from_value(json!({
            "id": 3,
            "email": "dev@example.com",
            "username": "dev",
            "first_name": "Ada",
            "last_name": "L",
            "full_name": "Ada L",
            "bio": "Builds things",
            "github_username": "ada",
            "linkedin_url": "",
            "portfolio_url": "https://ada.dev",
            "avatar": null,
            "is_verified": true,
            "date_joined": "2024-01-02T03:04:05Z",
            "updated_at": "2024-02-01T00:00:00.123456Z"
        }))
        .unwrap();

        assert_eq!(user.display_name(), "Ada L");
        assert!(user.is_verified);
        assert_eq!(user.date_joined.unwrap().timestamp(), 1704164645);
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("new bio".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"bio": "new bio"}));
        assert!(ProfileUpdate::default().is_empty());
    }
}
