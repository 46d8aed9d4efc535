//! SSE framing and ask-payload decoding.
//!
//! Two layers: [`SseStream`] turns a raw byte stream into framed SSE
//! events (`data:`/`event:`/`id:` blocks separated by blank lines), and
//! [`decode_update`] turns one `data:` payload into a
//! [`StreamUpdate`]. The payload shapes come from the web frontend's
//! streaming API and may drift; anything unexpected surfaces as
//! [`Error::Protocol`].

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use pin_project_lite::pin_project;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::models::response::SearchResult;
use crate::models::stream::{AnswerState, StreamUpdate};

pin_project! {
    /// Generic SSE stream parser.
    ///
    /// Consumes a stream of [`Bytes`] and yields raw SSE events.
    pub struct SseStream<S> {
        #[pin]
        byte_stream: S,
        buffer: String,
        pending_events: VecDeque<SseEvent>,
    }
}

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl<S> SseStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    pub fn new(byte_stream: S) -> Self {
        Self {
            byte_stream,
            buffer: String::new(),
            pending_events: VecDeque::new(),
        }
    }
}

impl<S> Stream for SseStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    type Item = Result<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if let Some(event) = this.pending_events.pop_front() {
            return Poll::Ready(Some(Ok(event)));
        }

        loop {
            match this.byte_stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.buffer.push_str(&String::from_utf8_lossy(&chunk));

                    // Events end at a blank line; tolerate CRLF framing.
                    while let Some((pos, sep_len)) = find_event_boundary(this.buffer) {
                        let block: String = this.buffer.drain(..pos).collect();
                        this.buffer.drain(..sep_len);

                        if let Some(event) = parse_sse_block(&block) {
                            this.pending_events.push_back(event);
                        }
                    }

                    if let Some(event) = this.pending_events.pop_front() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(Error::from_reqwest(e))));
                }
                Poll::Ready(None) => {
                    // Flush whatever is left in the buffer.
                    if !this.buffer.is_empty() {
                        if let Some(event) = parse_sse_block(this.buffer) {
                            this.pending_events.push_back(event);
                        }
                        this.buffer.clear();
                    }

                    return match this.pending_events.pop_front() {
                        Some(event) => Poll::Ready(Some(Ok(event))),
                        None => Poll::Ready(None),
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn find_event_boundary(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find("\n\n");
    let crlf = buffer.find("\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) if b < a => Some((b, 4)),
        (_, Some(b)) if lf.is_none() => Some((b, 4)),
        (Some(a), _) => Some((a, 2)),
        _ => None,
    }
}

fn parse_sse_block(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data = String::new();
    let mut id = None;

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event = Some(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else if let Some(value) = line.strip_prefix("id:") {
            id = Some(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }

    if data.is_empty() && event.is_none() && id.is_none() {
        return None;
    }

    Some(SseEvent { event, data, id })
}

/// Decode one `data:` payload from the ask stream.
///
/// Returns `Ok(None)` for keepalive frames with no data payload. A data
/// payload that is not a JSON object is a protocol violation.
pub fn decode_update(data: &str) -> Result<Option<StreamUpdate>> {
    if data.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|e| Error::Protocol(format!("undecodable SSE data payload: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| Error::Protocol("SSE data payload is not a JSON object".into()))?;

    let mut update = StreamUpdate {
        backend_uuid: obj
            .get("backend_uuid")
            .and_then(Value::as_str)
            .map(str::to_string),
        thread_title: obj
            .get("thread_title")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_final: obj.get("final").and_then(Value::as_bool).unwrap_or(false),
        answer: None,
        raw: value.clone(),
    };

    if let Some(text) = obj.get("text").and_then(Value::as_str) {
        update.answer = decode_answer_text(text)?;
    }

    Ok(Some(update))
}

/// The `text` field is a JSON string which decodes to either a list of
/// generation steps (the answer lives in the step with
/// `step_type == "FINAL"`) or a direct answer object.
fn decode_answer_text(text: &str) -> Result<Option<AnswerState>> {
    let decoded: Value = serde_json::from_str(text)
        .map_err(|e| Error::Protocol(format!("undecodable `text` field: {e}")))?;

    match decoded {
        Value::Array(steps) => {
            for step in &steps {
                if step.get("step_type").and_then(Value::as_str) == Some("FINAL") {
                    let content = step.get("content").cloned().unwrap_or(Value::Null);
                    return Ok(Some(answer_state_from(final_step_answer(content)?)));
                }
            }
            // Intermediate step lists (search progress etc.) carry no
            // answer yet.
            trace!("step list without FINAL step");
            Ok(None)
        }
        Value::Object(_) => Ok(Some(answer_state_from(decoded))),
        _ => Err(Error::Protocol(
            "`text` field is neither a step list nor an answer object".into(),
        )),
    }
}

/// In the schematized shape, `content.answer` is itself a JSON-encoded
/// object; otherwise `content` is the answer object directly.
fn final_step_answer(content: Value) -> Result<Value> {
    if let Some(answer) = content.get("answer").and_then(Value::as_str) {
        let trimmed = answer.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return serde_json::from_str(trimmed)
                .map_err(|e| Error::Protocol(format!("undecodable FINAL step answer: {e}")));
        }
    }
    Ok(content)
}

fn answer_state_from(answer_data: Value) -> AnswerState {
    let answer = answer_data
        .get("answer")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let chunks = answer_data
        .get("chunks")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    // Non-object entries are skipped rather than failing the whole
    // update; the upstream occasionally mixes in nulls.
    let web_results = answer_data
        .get("web_results")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_object())
                .map(|r| SearchResult {
                    title: r.get("name").and_then(Value::as_str).map(str::to_string),
                    snippet: r.get("snippet").and_then(Value::as_str).map(str::to_string),
                    url: r.get("url").and_then(Value::as_str).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    AnswerState {
        answer,
        chunks,
        web_results,
    }
}
