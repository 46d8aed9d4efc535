//! Transport layer: the seam between the client API and the wire.
//!
//! [`Transport`] is the injection point for tests and alternative
//! backends; [`HttpTransport`] is the production implementation.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::Result;
use crate::models::request::AskPayload;
use crate::models::stream::StreamUpdate;

pub mod headers;
pub mod http;
pub mod sse;

pub use http::HttpTransport;

/// Stream of decoded updates for one ask exchange.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<StreamUpdate>> + Send>>;

/// Abstraction over the WebUI endpoints.
///
/// `ask` must yield updates in upstream order and end the stream after
/// the final update. Dropping the returned stream releases the
/// underlying connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit an ask payload and open its update stream.
    async fn ask(&self, payload: &AskPayload) -> Result<UpdateStream>;

    /// Upload a file attachment; returns the URL to reference it by in
    /// an ask payload.
    async fn upload(&self, path: &Path) -> Result<String>;
}
