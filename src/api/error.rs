use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const GENERIC_MESSAGE: &str = "An error occurred";

/// Errors surfaced by [`ApiClient`](super::ApiClient) calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, timeout)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        /// Field-level validation errors, when the backend sent any
        errors: Option<Value>,
    },

    /// A success response whose body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Build an [`ApiError::Http`] from a non-success status and its JSON body
    /// (`Value::Null` when the body was empty or not JSON).
    pub fn from_response(status: StatusCode, body: &Value) -> Self {
        let message = ["detail", "message"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .or_else(|| {
                body.get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(Value::as_str)
            })
            .unwrap_or(GENERIC_MESSAGE)
            .to_string();

        Self::Http {
            status,
            message,
            errors: field_errors(status, body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn field_errors(&self) -> Option<&Value> {
        match self {
            Self::Http { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }
}

fn field_errors(status: StatusCode, body: &Value) -> Option<Value> {
    match body.get("errors") {
        Some(Value::Null) | None => {}
        Some(Value::Array(items)) if items.is_empty() => {}
        Some(Value::Object(map)) if map.is_empty() => {}
        Some(errors) => return Some(errors.clone()),
    }

    // DRF's default validation shape is a bare `{field: [messages]}` map
    let is_bare_field_map = body.as_object().is_some_and(|map| {
        !map.is_empty() && !["detail", "message", "error", "status"].iter().any(|key| map.contains_key(*key))
    });
    if status == StatusCode::BAD_REQUEST && is_bare_field_map {
        return Some(body.clone());
    }
    None
}
