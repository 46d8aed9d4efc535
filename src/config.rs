//! Configuration constants and URL helpers for the WebUI endpoints.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default base URL of the WebUI.
pub const DEFAULT_BASE_URL: &str = "https://www.perplexity.ai";

/// Protocol version sent in every ask payload. Mirrors what the web
/// frontend currently sends; bump when the upstream does.
pub const API_VERSION: &str = "2.18";

/// Connect timeout for HTTP requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default overall request timeout. Generation of a long answer can take
/// minutes, so this is generous; callers can lower it via the builder.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(1800);

/// Maximum number of file attachments per ask.
pub const MAX_ATTACHMENTS: usize = 30;

/// Maximum size of a single attachment in bytes (50 MB).
pub const MAX_ATTACHMENT_SIZE: u64 = 50 * 1024 * 1024;

/// Path of the SSE ask endpoint, relative to the base URL.
const ASK_PATH: &str = "/rest/sse/perplexity_ask";

/// Path of the search warm-up endpoint.
const SEARCH_NEW_PATH: &str = "/search/new";

/// Path of the attachment upload-URL endpoint.
const CREATE_UPLOAD_URL_PATH: &str = "/rest/uploads/create_upload_url";

/// Parse and normalize a base URL, rejecting anything that is not http(s).
pub fn parse_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base)
        .map_err(|e| Error::Config(format!("invalid base URL '{base}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "invalid base URL '{base}': unsupported scheme '{other}'"
        ))),
    }
}

/// Returns the SSE ask endpoint URL.
pub fn ask_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path(ASK_PATH);
    url
}

/// Returns the warm-up URL for a query. The web frontend hits this before
/// opening the SSE connection to initialize the server-side session.
pub fn search_warmup_url(base: &Url, query: &str) -> Url {
    let mut url = base.clone();
    url.set_path(SEARCH_NEW_PATH);
    url.query_pairs_mut().append_pair("q", query);
    url
}

/// Returns the attachment upload-URL endpoint.
pub fn create_upload_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path(CREATE_UPLOAD_URL_PATH);
    url
}

/// Validate a BCP 47-ish locale string like `en-US` or `de`.
pub fn validate_locale(language: &str) -> Result<()> {
    use std::sync::LazyLock;
    static LOCALE_RE: LazyLock<regex_lite::Regex> =
        LazyLock::new(|| regex_lite::Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").unwrap());
    if LOCALE_RE.is_match(language) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid language '{language}' (expected a locale like 'en-US')"
        )))
    }
}
