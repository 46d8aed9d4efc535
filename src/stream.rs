//! Incremental response streaming.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use crate::citations::format_citations;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::models::options::CitationMode;
use crate::models::response::{Response, SearchResult};
use crate::models::stream::ResponseChunk;
use crate::transport::UpdateStream;

/// Where a stream is in its single-pass lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StreamState {
    /// Updates are still arriving.
    Streaming,
    /// The final chunk has been yielded (or the stream failed); the next
    /// poll ends the stream.
    Drained,
    /// The stream already ended once; polling again is a usage error,
    /// reported exactly once.
    Spent,
    Exhausted,
}

/// A single-pass stream of [`ResponseChunk`]s for one ask exchange.
///
/// Chunks arrive in upstream order and each one supersedes the previous:
/// `answer` is the cumulative text so far, and only the chunk with
/// `is_final` set is authoritative. The underlying connection is released
/// as soon as the final update arrives, or when the stream is dropped
/// early.
///
/// The stream can be consumed once. Polling it again after it has ended
/// yields a single [`Error::Usage`].
pub struct ResponseStream {
    inner: Option<UpdateStream>,
    state: StreamState,
    citation_mode: CitationMode,
    conversation: Option<Conversation>,
    answer: String,
    fragments: Vec<String>,
    title: Option<String>,
    citations: Vec<SearchResult>,
    conversation_uuid: Option<String>,
    raw: Value,
}

impl ResponseStream {
    pub(crate) fn new(
        inner: UpdateStream,
        citation_mode: CitationMode,
        conversation: Option<Conversation>,
    ) -> Self {
        Self {
            inner: Some(inner),
            state: StreamState::Streaming,
            citation_mode,
            conversation,
            answer: String::new(),
            fragments: Vec::new(),
            title: None,
            citations: Vec::new(),
            conversation_uuid: None,
            raw: Value::Null,
        }
    }

    /// Convenience wrapper around `StreamExt::next`.
    pub async fn next_chunk(&mut self) -> Option<Result<ResponseChunk>> {
        self.next().await
    }

    /// Drain the stream and assemble the final [`Response`].
    pub async fn collect(mut self) -> Result<Response> {
        let mut last = None;
        while let Some(chunk) = self.next().await {
            last = Some(chunk?);
        }
        let last = last.ok_or_else(|| {
            Error::Stream("stream produced no chunks".into())
        })?;
        if !last.is_final {
            return Err(Error::Stream(
                "stream ended before the final chunk".into(),
            ));
        }
        Ok(Response {
            answer: last.answer,
            title: last.title,
            citations: last.citations,
            chunks: self.fragments,
            conversation_uuid: self.conversation_uuid,
            raw: self.raw,
        })
    }

    fn make_chunk(&self, last_delta: Option<String>, is_final: bool) -> ResponseChunk {
        ResponseChunk {
            answer: format_citations(self.citation_mode, &self.answer, &self.citations),
            title: self.title.clone(),
            citations: self.citations.clone(),
            last_delta,
            is_final,
        }
    }
}

impl Stream for ResponseStream {
    type Item = Result<ResponseChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.state {
            StreamState::Streaming => {}
            StreamState::Drained => {
                this.state = StreamState::Spent;
                return Poll::Ready(None);
            }
            StreamState::Spent => {
                this.state = StreamState::Exhausted;
                return Poll::Ready(Some(Err(Error::Usage(
                    "response stream already consumed; streams are single-pass".into(),
                ))));
            }
            StreamState::Exhausted => return Poll::Ready(None),
        }

        let Some(inner) = this.inner.as_mut() else {
            this.state = StreamState::Spent;
            return Poll::Ready(None);
        };

        loop {
            match inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(update))) => {
                    if let Some(uuid) = update.backend_uuid.as_deref() {
                        if this.conversation_uuid.is_none() {
                            this.conversation_uuid = Some(uuid.to_string());
                        }
                        if let Some(conversation) = &this.conversation {
                            conversation.record_backend_uuid(uuid);
                        }
                    }
                    if update.thread_title.is_some() {
                        this.title = update.thread_title;
                    }
                    this.raw = update.raw;

                    let mut last_delta = None;
                    let has_answer = update.answer.is_some();
                    if let Some(answer) = update.answer {
                        let newly: Vec<String> = answer
                            .chunks
                            .iter()
                            .skip(this.fragments.len())
                            .cloned()
                            .collect();
                        if !newly.is_empty() {
                            last_delta = Some(newly.concat());
                            this.fragments.extend(newly);
                        } else if answer.answer.len() > this.answer.len()
                            && answer.answer.starts_with(this.answer.as_str())
                        {
                            // No fragment list; derive the delta from the
                            // cumulative snapshot.
                            last_delta = Some(answer.answer[this.answer.len()..].to_string());
                        }
                        this.answer = answer.answer;
                        if !answer.web_results.is_empty() {
                            this.citations = answer.web_results;
                        }
                    }

                    if update.is_final {
                        debug!(
                            chunks = this.fragments.len(),
                            citations = this.citations.len(),
                            "stream complete"
                        );
                        this.inner = None;
                        this.state = StreamState::Drained;
                        return Poll::Ready(Some(Ok(this.make_chunk(last_delta, true))));
                    }
                    if has_answer {
                        return Poll::Ready(Some(Ok(this.make_chunk(last_delta, false))));
                    }
                    // Metadata-only update; keep polling.
                }
                Poll::Ready(Some(Err(e))) => {
                    this.inner = None;
                    this.state = StreamState::Drained;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.inner = None;
                    this.state = StreamState::Drained;
                    return Poll::Ready(Some(Err(Error::Stream(
                        "stream ended before the final update".into(),
                    ))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
