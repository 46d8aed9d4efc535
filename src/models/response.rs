//! Resolved response types.

use serde::{Deserialize, Serialize};

/// A cited source backing part of an answer.
///
/// All fields are optional because the upstream omits them freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub url: Option<String>,
}

/// A fully resolved answer from the blocking path.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final answer text, already formatted per the citation mode.
    pub answer: String,
    /// Thread title assigned by the service.
    pub title: Option<String>,
    /// Ordered citation list; index `n-1` backs marker `[n]`.
    pub citations: Vec<SearchResult>,
    /// Incremental text fragments as the upstream produced them.
    pub chunks: Vec<String>,
    /// Opaque server-side conversation reference, if one was assigned.
    pub conversation_uuid: Option<String>,
    /// Raw final answer payload, for callers that need fields this crate
    /// does not model.
    pub raw: serde_json::Value,
}
