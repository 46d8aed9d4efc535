//! Unofficial Rust client for the Perplexity AI WebUI.
//!
//! Talks to the same endpoints the web frontend uses, authenticated with
//! a session cookie captured from a logged-in browser session. Both a
//! blocking ask (await the complete answer) and an incremental stream of
//! cumulative answer snapshots are supported, along with multi-turn
//! conversations, model selection, search shaping and file attachments.
//!
//! This is not an official API. The endpoints are an upstream-internal
//! contract: they can change without notice, and unexpected response
//! shapes surface as [`Error::Protocol`]. Nothing is retried
//! automatically.
//!
//! # Quick start
//!
//! ```no_run
//! use futures::StreamExt;
//! use perplexity_webui::{CitationMode, Model, PerplexityClient};
//!
//! # async fn run() -> perplexity_webui::Result<()> {
//! let client = PerplexityClient::builder()
//!     .session_token(std::env::var("PERPLEXITY_SESSION_TOKEN").unwrap_or_default())
//!     .build()?;
//!
//! // Blocking: await the complete answer.
//! let response = client
//!     .ask("Why is the sky blue?")
//!     .model(Model::Sonar)
//!     .citation_mode(CitationMode::Markdown)
//!     .send()
//!     .await?;
//! println!("{}", response.answer);
//!
//! // Streaming: each chunk carries the cumulative answer so far.
//! let mut stream = client.ask("Tell me more").send_stream().await?;
//! while let Some(chunk) = stream.next().await {
//!     println!("{}", chunk?.answer);
//! }
//! # Ok(()) }
//! ```

pub mod api;
pub mod auth;
pub mod citations;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use api::AskRequestBuilder;
pub use auth::SessionAuthenticator;
pub use citations::format_citations;
pub use client::{PerplexityClient, PerplexityClientBuilder};
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use models::options::{
    AskOptions, AskOptionsBuilder, CitationMode, Coordinates, Model, SearchFocus, SourceFocus,
    TimeRange,
};
pub use models::response::{Response, SearchResult};
pub use models::stream::{AnswerState, ResponseChunk, StreamUpdate};
pub use stream::ResponseStream;
pub use transport::{HttpTransport, Transport, UpdateStream};
