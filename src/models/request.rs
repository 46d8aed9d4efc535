//! Wire payload for the SSE ask endpoint.
//!
//! Field names and constants mirror what the web frontend sends; they are
//! an upstream-internal contract and may drift.

use serde::Serialize;

use crate::config::API_VERSION;
use crate::models::options::AskOptions;

/// Body of `POST /rest/sse/perplexity_ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskPayload {
    pub params: AskParams,
    pub query_str: String,
}

/// The `params` object of an ask payload.
#[derive(Debug, Clone, Serialize)]
pub struct AskParams {
    /// URLs of previously-uploaded attachments.
    pub attachments: Vec<String>,
    pub language: String,
    pub timezone: Option<String>,
    pub client_coordinates: Option<ClientCoordinates>,
    pub sources: Vec<&'static str>,
    pub model_preference: &'static str,
    pub mode: &'static str,
    pub search_focus: &'static str,
    pub search_recency_filter: Option<&'static str>,
    pub is_incognito: bool,
    pub use_schematized_api: bool,
    pub local_search_enabled: bool,
    pub prompt_source: &'static str,
    pub send_back_text_in_streaming_api: bool,
    pub version: &'static str,
    /// Continuation reference for follow-up queries in a conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_backend_uuid: Option<String>,
}

/// Geolocation as the frontend encodes it.
#[derive(Debug, Clone, Serialize)]
pub struct ClientCoordinates {
    pub location_lat: f64,
    pub location_lng: f64,
    /// Always empty; the frontend sends the field regardless.
    pub name: String,
}

/// Assemble the wire payload from validated options.
pub fn build_ask_payload(
    query: &str,
    options: &AskOptions,
    attachment_urls: Vec<String>,
    last_backend_uuid: Option<String>,
) -> AskPayload {
    AskPayload {
        params: AskParams {
            attachments: attachment_urls,
            language: options.language.clone(),
            timezone: options.timezone.clone(),
            client_coordinates: options.coordinates.map(|c| ClientCoordinates {
                location_lat: c.latitude(),
                location_lng: c.longitude(),
                name: String::new(),
            }),
            sources: options.sources.iter().map(|s| s.wire_value()).collect(),
            model_preference: options.model.identifier(),
            mode: options.model.mode(),
            search_focus: options.search_focus.wire_value(),
            search_recency_filter: options.time_range.wire_value(),
            is_incognito: !options.save_to_library,
            use_schematized_api: false,
            local_search_enabled: true,
            prompt_source: "user",
            send_back_text_in_streaming_api: true,
            version: API_VERSION,
            last_backend_uuid,
        },
        query_str: query.to_string(),
    }
}
