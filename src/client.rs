//! The client entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::auth::SessionAuthenticator;
use crate::config;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::models::options::AskOptions;
use crate::transport::{HttpTransport, Transport};
use crate::AskRequestBuilder;

/// Client for the Perplexity AI WebUI.
///
/// Cheap to clone and safe to share across tasks; each ask opens its own
/// SSE exchange.
///
/// ```no_run
/// # async fn run() -> perplexity_webui::Result<()> {
/// use perplexity_webui::PerplexityClient;
///
/// let client = PerplexityClient::new("session-token-from-browser")?;
/// let response = client.ask("What is the airspeed of an unladen swallow?").send().await?;
/// println!("{}", response.answer);
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct PerplexityClient {
    transport: Arc<dyn Transport>,
    defaults: AskOptions,
}

impl std::fmt::Debug for PerplexityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityClient")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl PerplexityClient {
    /// Create a client with default settings from a session token.
    pub fn new(session_token: impl Into<String>) -> Result<Self> {
        Self::builder().session_token(session_token).build()
    }

    pub fn builder() -> PerplexityClientBuilder {
        PerplexityClientBuilder::default()
    }

    /// Start an ask. Nothing is sent until the returned builder's
    /// `send` or `send_stream` is awaited.
    pub fn ask(&self, query: impl Into<String>) -> AskRequestBuilder {
        AskRequestBuilder::new(Arc::clone(&self.transport), self.defaults.clone(), query)
    }

    /// Create a conversation using the client's default options.
    pub fn create_conversation(&self) -> Conversation {
        Conversation::new(None)
    }

    /// Create a conversation with its own default options, applied to
    /// every ask on it unless overridden per call.
    pub fn create_conversation_with(&self, options: AskOptions) -> Result<Conversation> {
        options.validate()?;
        Ok(Conversation::new(Some(options)))
    }

    /// The client-level default options.
    pub fn defaults(&self) -> &AskOptions {
        &self.defaults
    }
}

/// Builder for [`PerplexityClient`].
#[derive(Default)]
pub struct PerplexityClientBuilder {
    session_token: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    danger_accept_invalid_certs: bool,
    reqwest_client: Option<reqwest::Client>,
    transport: Option<Arc<dyn Transport>>,
    defaults: Option<AskOptions>,
}

impl PerplexityClientBuilder {
    /// The `__Secure-next-auth.session-token` cookie value captured from
    /// a logged-in browser session.
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Override the WebUI base URL (useful against a local test server).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overall per-request timeout. Defaults to a generous value since a
    /// long answer can take minutes to generate.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable TLS certificate verification, for debugging through an
    /// intercepting proxy.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }

    /// Supply a preconfigured reqwest client instead of building one.
    pub fn reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest_client = Some(client);
        self
    }

    /// Replace the whole transport layer. Used by tests; when set, the
    /// session token and HTTP settings are ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Default options applied to every ask unless overridden.
    pub fn default_options(mut self, options: AskOptions) -> Self {
        self.defaults = Some(options);
        self
    }

    pub fn build(self) -> Result<PerplexityClient> {
        let defaults = match self.defaults {
            Some(options) => {
                options.validate()?;
                options
            }
            None => AskOptions::default(),
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let token = match self.session_token {
                    Some(token) => token,
                    None => {
                        return Err(Error::Config(
                            "a session token is required; capture the \
                             __Secure-next-auth.session-token cookie from a browser session"
                                .into(),
                        ))
                    }
                };
                let auth = SessionAuthenticator::new(token)?;
                let base = config::parse_base_url(
                    self.base_url.as_deref().unwrap_or(config::DEFAULT_BASE_URL),
                )?;

                let client = match self.reqwest_client {
                    Some(client) => client,
                    None => reqwest::Client::builder()
                        .connect_timeout(config::CONNECT_TIMEOUT)
                        .timeout(self.timeout.unwrap_or(config::REQUEST_TIMEOUT))
                        .danger_accept_invalid_certs(self.danger_accept_invalid_certs)
                        .build()?,
                };

                debug!(base = %base, "client configured");
                Arc::new(HttpTransport::new(client, auth, base)) as Arc<dyn Transport>
            }
        };

        Ok(PerplexityClient {
            transport,
            defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_required_without_custom_transport() {
        let err = PerplexityClient::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = PerplexityClient::builder()
            .session_token("tok")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_defaults_rejected() {
        let bad = AskOptions {
            language: "bogus".into(),
            ..AskOptions::default()
        };
        let err = PerplexityClient::builder()
            .session_token("tok")
            .default_options(bad)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
