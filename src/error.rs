//! Error types for the NGSI-LD client

use thiserror::Error;

/// Errors that can occur when building or exchanging NGSI-LD documents
#[derive(Error, Debug)]
pub enum NgsildError {
    /// observedAt was given as a JSON value that is not a string
    #[error("observedAt must be a string or a datetime, got JSON {0}")]
    InvalidTimestamp(String),

    /// A broker operation received a document of the wrong kind
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The identity endpoint did not return success
    #[error("identity endpoint returned {status}")]
    CredentialAcquisition { status: reqwest::StatusCode },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required configuration value is missing from the environment
    #[error("missing configuration: {0}")]
    Config(String),
}

pub type NgsildResult<T> = Result<T, NgsildError>;
