//! Error types for the Perplexity WebUI client.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the Perplexity WebUI.
///
/// The taxonomy is deliberately flat so callers can decide between
/// re-authenticating ([`Error::Authentication`]), fixing their input
/// ([`Error::Config`] / [`Error::Usage`]) or giving up
/// ([`Error::Protocol`] and the network variants). Nothing is retried
/// internally; every error surfaces to the immediate caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session token was rejected by the upstream (401/403).
    ///
    /// There is no recovery without a fresh token captured from a
    /// logged-in browser session, so this is never retried.
    #[error("Authentication rejected: {0}")]
    Authentication(String),

    /// Locally-detectable invalid input. Raised before any network call.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configured deadline elapsed while waiting for the upstream
    /// response or the next stream chunk.
    #[error("Request timed out")]
    Timeout,

    /// An operation was invoked in the wrong order, e.g. iterating a
    /// fully-consumed response stream a second time.
    #[error("Usage error: {0}")]
    Usage(String),

    /// The upstream response did not match the expected shape.
    ///
    /// The WebUI endpoints are an unversioned internal API; schema drift
    /// is the primary real-world failure mode and is surfaced rather than
    /// silently swallowed.
    #[error("Unexpected upstream response: {0}")]
    Protocol(String),

    /// Non-success HTTP status other than an authentication rejection.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure from the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The SSE stream broke mid-response.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Failed to read an attachment from disk.
    #[error("Failed to read attachment {path}: {source}")]
    AttachmentIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classify a non-success HTTP status the way the WebUI uses them:
    /// 401/403 mean the session cookie is invalid or expired, everything
    /// else is an opaque API failure.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Authentication(format!(
                "upstream returned {status}; the session token is invalid or expired"
            )),
            _ => Error::Api { status, message },
        }
    }

    /// Map a reqwest error, preserving timeouts as their own variant so
    /// callers can distinguish them from authentication and validation
    /// failures.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_403_is_authentication() {
        assert!(matches!(
            Error::from_status(403, String::new()),
            Error::Authentication(_)
        ));
        assert!(matches!(
            Error::from_status(401, String::new()),
            Error::Authentication(_)
        ));
    }

    #[test]
    fn other_statuses_are_api_errors() {
        match Error::from_status(500, "boom".into()) {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
