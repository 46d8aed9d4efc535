//! Session-cookie authentication.
//!
//! The WebUI authenticates browser requests with the
//! `__Secure-next-auth.session-token` cookie. The token is opaque, its
//! expiry is unverifiable client-side, and there is no refresh endpoint:
//! when the upstream rejects it (401/403) the only recovery is a fresh
//! token captured manually from a logged-in browser session.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};

use crate::error::{Error, Result};

/// Cookie name carrying the session token.
pub const SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

/// Environment variable checked by [`SessionAuthenticator::from_env`].
pub const SESSION_TOKEN_ENV: &str = "PERPLEXITY_SESSION_TOKEN";

/// An opaque session credential and when we received it.
#[derive(Clone)]
pub struct SessionToken {
    value: String,
    acquired_at: DateTime<Utc>,
}

impl SessionToken {
    fn new(value: String) -> Result<Self> {
        if value.trim().is_empty() {
            return Err(Error::Config("session token must not be empty".into()));
        }
        Ok(Self {
            value,
            acquired_at: Utc::now(),
        })
    }

    /// When this token was handed to the client. Expiry is unknown; this
    /// only helps callers report how stale a rejected token was.
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

// Never leak the credential through Debug output or logs.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Holds the session credential and decorates outbound requests with it.
///
/// Read-only after construction, so it can be shared freely across
/// concurrent asks without locking.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    token: SessionToken,
}

impl SessionAuthenticator {
    /// Create an authenticator from a session token string.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            token: SessionToken::new(token.into())?,
        })
    }

    /// Read the token from `PERPLEXITY_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(SESSION_TOKEN_ENV).map_err(|_| {
            Error::Config(format!("environment variable {SESSION_TOKEN_ENV} is not set"))
        })?;
        Self::new(value)
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Render the `Cookie` header value.
    pub fn cookie_value(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.token.value)
    }

    /// Attach the session cookie to a header map.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let value = HeaderValue::from_str(&self.cookie_value()).map_err(|_| {
            Error::Config("session token contains characters invalid in a header".into())
        })?;
        headers.insert(COOKIE, value);
        Ok(())
    }
}
