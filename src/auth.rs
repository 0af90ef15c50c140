//! Authenticated session for broker calls
//!
//! Holds the OAuth2 client credentials and the current access token.
//! `token == None` is the unauthenticated state; a successful call to
//! the identity endpoint transitions to authenticated, and any broker
//! response of 401 transitions back before a single renewal attempt.

use std::fmt;
use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{NgsildError, NgsildResult};

const GRANT_TYPE: &str = "client_credentials";
const MEDIA_TYPE_LD_JSON: &str = "application/ld+json";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A session against one identity endpoint, shared by every call of
/// one [`ContextBroker`](crate::broker::ContextBroker).
///
/// Credential state is mutated in place, so running an operation takes
/// `&mut self`; sharing a session across uncoordinated concurrent
/// callers therefore does not compile without an external lock, which
/// is the intended usage constraint.
pub struct AuthSession {
    http: reqwest::Client,
    identity_url: String,
    client_id: String,
    client_secret: String,
    token: Option<String>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("identity_url", &self.identity_url)
            .field("client_id", &self.client_id)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl AuthSession {
    pub fn new(
        http: reqwest::Client,
        identity_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        AuthSession {
            http,
            identity_url: identity_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        AuthSession::new(
            reqwest::Client::new(),
            config.identity_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The HTTP client shared with the broker gateway.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Run `operation` under the session's current headers.
    ///
    /// Acquires credentials first if the session has none. If the
    /// response is 401, credentials are re-acquired exactly once and
    /// `operation` is re-run once with refreshed headers; whatever that
    /// second run produces is returned as-is. Every other response,
    /// success or not, is handed back unmodified.
    pub async fn execute<F, Fut>(&mut self, operation: F) -> NgsildResult<reqwest::Response>
    where
        F: Fn(HeaderMap) -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        if self.token.is_none() {
            self.acquire_token().await?;
        }

        let response = operation(self.request_headers()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("broker answered 401, renewing credentials and retrying once");
        self.token = None;
        self.acquire_token().await?;
        Ok(operation(self.request_headers()).await?)
    }

    /// One POST to the identity endpoint with form-encoded
    /// client-credentials parameters. Non-success is a hard failure
    /// carrying the observed status.
    async fn acquire_token(&mut self) -> NgsildResult<()> {
        let response = self
            .http
            .post(&self.identity_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", GRANT_TYPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NgsildError::CredentialAcquisition { status });
        }

        let token: TokenResponse = response.json().await?;
        self.token = Some(token.access_token);
        tracing::debug!(identity_url = %self.identity_url, "acquired access token");
        Ok(())
    }

    /// Headers for broker calls under the current token. A token that
    /// is not valid header material is treated as absent.
    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE_LD_JSON));
        headers
    }
}
