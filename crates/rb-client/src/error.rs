//! Error kinds surfaced by Review Board client operations

use thiserror::Error;

/// Errors returned by [`crate::ReviewBoardClient`] implementations.
///
/// Only two failure paths are recovered locally: an `Authorization` error is
/// retried once after prompting for credentials (see [`crate::ReauthClient`]),
/// and malformed diff line records are skipped by the reconciler. Everything
/// else reaches the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The review server could not be reached (DNS, refused, timeout, TLS).
    #[error("Cannot reach review server: {0}")]
    Connection(String),

    /// The server rejected the request for lack of a valid session.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Authorization failed again after re-prompting for credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An operation was used against a server speaking the wrong protocol.
    #[error("Operation requires review server {required}, server is {actual}")]
    UnsupportedProtocol { required: String, actual: String },

    /// Fetching a file from source control failed.
    #[error("Source control error: {0}")]
    SourceControl(String),

    /// A response body or server field could not be decoded.
    #[error("Failed to parse server response: {0}")]
    Parse(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server advertised no usable URI template for a resource.
    #[error("URI template error: {0}")]
    Template(String),

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// Map a transport-level reqwest failure.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Connection(err.to_string())
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, ClientError::Authorization(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<rb_diff::ParseError> for ClientError {
    fn from(err: rb_diff::ParseError) -> Self {
        ClientError::Parse(err.to_string())
    }
}

/// Convenience alias used throughout the client crates.
pub type Result<T> = std::result::Result<T, ClientError>;
