//! Browser-simulation header construction.
//!
//! The WebUI endpoints reject requests that do not look like they came
//! from the web frontend, so every request carries the full set of
//! headers a Chrome session would send, plus the session cookie.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};

use crate::auth::SessionAuthenticator;
use crate::error::Result;

/// User agent matching a current desktop Chrome build.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Build the standard headers for WebUI requests.
pub fn webui_headers(auth: &SessionAuthenticator, base_origin: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        REFERER,
        HeaderValue::from_str(&format!("{base_origin}/"))
            .unwrap_or_else(|_| HeaderValue::from_static("https://www.perplexity.ai/")),
    );
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(base_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("https://www.perplexity.ai")),
    );

    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Google Chrome\";v=\"136\", \"Chromium\";v=\"136\", \"Not.A/Brand\";v=\"24\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("te"), HeaderValue::from_static("trailers"));

    auth.apply(&mut headers)?;
    Ok(headers)
}

/// Headers for the SSE ask request: the standard set plus the
/// event-stream accept header.
pub fn sse_headers(auth: &SessionAuthenticator, base_origin: &str) -> Result<HeaderMap> {
    let mut headers = webui_headers(auth, base_origin)?;
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    Ok(headers)
}
