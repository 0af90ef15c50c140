//! Client configuration
//!
//! Endpoints and credentials come either from explicit values or from
//! the process environment. Variable names and precedence are
//! deployment plumbing; everything else in the crate takes a
//! [`ClientConfig`] and does not care where it came from.

use std::fmt;

use crate::error::{NgsildError, NgsildResult};

pub const ENV_BROKER_URL: &str = "NGSILD_BROKER_URL";
pub const ENV_IDENTITY_URL: &str = "NGSILD_IDENTITY_URL";
pub const ENV_CLIENT_ID: &str = "NGSILD_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "NGSILD_CLIENT_SECRET";

/// Connection settings for a context broker and its identity endpoint.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the context broker, e.g. `https://broker.example.com`.
    pub broker_url: String,
    /// Token endpoint of the identity service.
    pub identity_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientConfig {
    pub fn new(
        broker_url: impl Into<String>,
        identity_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        ClientConfig {
            broker_url: broker_url.into(),
            identity_url: identity_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read the full configuration from `NGSILD_*` environment
    /// variables. A missing variable fails with
    /// [`NgsildError::Config`] naming it.
    pub fn from_env() -> NgsildResult<Self> {
        Ok(ClientConfig {
            broker_url: require_env(ENV_BROKER_URL)?,
            identity_url: require_env(ENV_IDENTITY_URL)?,
            client_id: require_env(ENV_CLIENT_ID)?,
            client_secret: require_env(ENV_CLIENT_SECRET)?,
        })
    }
}

// Keep the client secret out of debug output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("broker_url", &self.broker_url)
            .field("identity_url", &self.identity_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

fn require_env(name: &str) -> NgsildResult<String> {
    std::env::var(name).map_err(|_| NgsildError::Config(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_from_environment_and_reports_missing_variables() {
        std::env::set_var(ENV_BROKER_URL, "http://broker.local");
        std::env::set_var(ENV_IDENTITY_URL, "http://identity.local/token");
        std::env::set_var(ENV_CLIENT_ID, "client-id");
        std::env::set_var(ENV_CLIENT_SECRET, "client-secret");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.broker_url, "http://broker.local");
        assert_eq!(config.client_id, "client-id");

        std::env::remove_var(ENV_CLIENT_SECRET);
        match ClientConfig::from_env() {
            Err(NgsildError::Config(name)) => assert_eq!(name, ENV_CLIENT_SECRET),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = ClientConfig::new("b", "i", "id", "very-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("very-secret"));
    }
}
