//! Error taxonomy for the authentication lifecycle and the data endpoints.

use thiserror::Error;

/// Errors surfaced by the token store, the OAuth client, the session and the
/// Spotify data facade.
///
/// Payloads are plain strings so the error can be cloned and handed to every
/// task waiting on the same token operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("No PKCE code verifier stored. Start a new login first.")]
    MissingVerifier,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Spotify rejected the access token")]
    Unauthorized,

    #[error("Spotify request failed with status {status}: {message}")]
    RemoteRequestFailed { status: u16, message: String },

    #[error("Unknown time range '{0}'. Use short_term, medium_term or long_term.")]
    InvalidTimeRange(String),

    #[error("Limit {0} is out of range (1-50)")]
    InvalidLimit(u32),

    #[error("PKCE verifier length {0} is out of range (43-128)")]
    InvalidVerifierLength(usize),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl ClientError {
    /// Returns true for failures after which no usable session remains.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::MissingVerifier
                | ClientError::TokenExchangeFailed(_)
                | ClientError::NoRefreshToken
                | ClientError::RefreshFailed(_)
                | ClientError::Unauthorized
        )
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
