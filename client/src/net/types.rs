//! Wire types for the auth backend and the errors it can produce.
//!
//! DESIGN
//! ======
//! The backend reports failures as JSON with a `detail` field. Hand-raised
//! errors carry a string; request-validation errors carry a list of entries
//! with a `msg` each. Both collapse into one user-facing string here so the
//! controller never inspects raw bodies.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Email + password pair sent to `/signup` and `/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

// Never print the password.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful `/login` body. Extra fields (`token_type`, `message`) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginToken {
    pub access_token: String,
}

/// Errors produced by auth backend calls.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend answered with a non-success status.
    #[error("auth backend rejected request: status {status}")]
    Rejected { status: u16, detail: Option<String> },

    /// The backend could not be reached or the transfer failed.
    #[error("auth backend unreachable: {0}")]
    Network(String),

    /// A success status arrived with a body we could not understand.
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthError {
    /// Human-readable detail supplied by the backend, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message to show the user: the backend detail, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_owned()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Pull the user-facing `detail` out of an error response body.
#[must_use]
pub fn parse_error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            if messages.is_empty() { None } else { Some(messages.join("; ")) }
        }
        _ => None,
    }
}
