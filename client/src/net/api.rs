//! REST calls to the remote auth backend.
//!
//! ERROR HANDLING
//! ==============
//! Every failure comes back as an [`AuthError`]; nothing here panics. The
//! session controller turns those into view state, so callers of the
//! controller never see them.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::types::{AuthError, Credentials, LoginToken, parse_error_detail};
use crate::config::AuthTimeouts;

/// The two calls the login shell makes. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] when the backend refuses (e.g. duplicate
    /// email) and [`AuthError::Network`] when it cannot be reached.
    async fn signup(&self, credentials: &Credentials) -> Result<(), AuthError>;

    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] for bad credentials, [`AuthError::Network`]
    /// when unreachable and [`AuthError::MalformedResponse`] when a success
    /// body carries no token.
    async fn login(&self, credentials: &Credentials) -> Result<LoginToken, AuthError>;
}

#[async_trait::async_trait]
impl<T: AuthApi + ?Sized> AuthApi for std::sync::Arc<T> {
    async fn signup(&self, credentials: &Credentials) -> Result<(), AuthError> {
        (**self).signup(credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginToken, AuthError> {
        (**self).login(credentials).await
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HttpClientBuild`] if the TLS backend or client
    /// cannot be initialized.
    pub fn new(base_url: impl Into<String>, timeouts: AuthTimeouts) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// POST credentials and return the raw success body.
    async fn post_credentials(&self, path: &str, credentials: &Credentials) -> Result<String, AuthError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "auth backend rejected request");
            return Err(AuthError::Rejected { status: status.as_u16(), detail: parse_error_detail(&text) });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn signup(&self, credentials: &Credentials) -> Result<(), AuthError> {
        // Any 2xx is an acknowledgement; the body is informational only.
        self.post_credentials("signup", credentials).await.map(|_| ())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginToken, AuthError> {
        let body = self.post_credentials("login", credentials).await?;
        parse_login_response(&body)
    }
}

fn parse_login_response(body: &str) -> Result<LoginToken, AuthError> {
    let token: LoginToken = serde_json::from_str(body).map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
    if token.access_token.is_empty() {
        return Err(AuthError::MalformedResponse("empty access_token".to_owned()));
    }
    Ok(token)
}
