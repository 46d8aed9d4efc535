//! Streaming types: decoded SSE updates and public response chunks.

use serde_json::Value;

use crate::models::response::SearchResult;

/// One decoded `data:` object from the ask SSE stream.
///
/// This is the transport-level unit; [`crate::ResponseStream`] turns these
/// into [`ResponseChunk`]s. Tests construct these directly through a mock
/// transport, which is why the fields are public.
#[derive(Debug, Clone, Default)]
pub struct StreamUpdate {
    /// Server-side conversation reference, present on the first update
    /// of an exchange.
    pub backend_uuid: Option<String>,
    /// Thread title, assigned once the service has one.
    pub thread_title: Option<String>,
    /// Set on the last update of the stream.
    pub is_final: bool,
    /// Decoded answer state, when the update carried one.
    pub answer: Option<AnswerState>,
    /// The raw data object, preserved for the blocking path.
    pub raw: Value,
}

/// Cumulative answer state decoded from an update's `text` field.
///
/// The upstream re-sends the whole answer so far on each update
/// (`send_back_text_in_streaming_api`), so `answer` is a snapshot, not a
/// delta; `chunks` holds the incremental fragments.
#[derive(Debug, Clone, Default)]
pub struct AnswerState {
    /// Full answer text produced so far (unformatted).
    pub answer: String,
    /// Incremental fragments in arrival order.
    pub chunks: Vec<String>,
    /// Citations known so far; may still grow while streaming.
    pub web_results: Vec<SearchResult>,
}

/// One incremental unit of a streamed answer, as yielded to callers.
#[derive(Debug, Clone)]
pub struct ResponseChunk {
    /// Cumulative answer text so far, formatted per the citation mode.
    ///
    /// Each chunk supersedes the previous one; the final chunk carries
    /// the complete, authoritative answer.
    pub answer: String,
    /// Thread title, once known.
    pub title: Option<String>,
    /// Citations known so far, in marker order.
    pub citations: Vec<SearchResult>,
    /// The most recent incremental fragment, when the upstream sent one.
    pub last_delta: Option<String>,
    /// True only for the last chunk of the stream.
    pub is_final: bool,
}
