//! Fluent builder for a single ask exchange.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::models::options::{
    AskOptions, CitationMode, Coordinates, Model, SearchFocus, SourceFocus, TimeRange,
};
use crate::models::request::build_ask_payload;
use crate::models::response::Response;
use crate::stream::ResponseStream;
use crate::transport::Transport;

/// One ask in flight: a query plus per-call option overrides.
///
/// Created by [`crate::PerplexityClient::ask`]. Option precedence is
/// per-call override, then conversation defaults, then client defaults.
/// Nothing touches the network until [`send`](Self::send) or
/// [`send_stream`](Self::send_stream); all local validation happens
/// before the first transport call.
pub struct AskRequestBuilder {
    transport: Arc<dyn Transport>,
    client_defaults: AskOptions,
    query: String,
    conversation: Option<Conversation>,
    replace_options: Option<AskOptions>,
    model: Option<Model>,
    citation_mode: Option<CitationMode>,
    search_focus: Option<SearchFocus>,
    sources: Option<Vec<SourceFocus>>,
    time_range: Option<TimeRange>,
    language: Option<String>,
    timezone: Option<String>,
    coordinates: Option<Coordinates>,
    save_to_library: Option<bool>,
    extra_files: Vec<PathBuf>,
}

impl AskRequestBuilder {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        client_defaults: AskOptions,
        query: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            client_defaults,
            query: query.into(),
            conversation: None,
            replace_options: None,
            model: None,
            citation_mode: None,
            search_focus: None,
            sources: None,
            time_range: None,
            language: None,
            timezone: None,
            coordinates: None,
            save_to_library: None,
            extra_files: Vec::new(),
        }
    }

    /// Continue a conversation: the ask references the conversation's
    /// server-side thread, and its answer extends that thread.
    pub fn conversation(mut self, conversation: &Conversation) -> Self {
        self.conversation = Some(conversation.clone());
        self
    }

    /// Replace the entire option bundle for this ask. Field-level
    /// overrides set on the builder still apply on top.
    pub fn options(mut self, options: AskOptions) -> Self {
        self.replace_options = Some(options);
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    pub fn citation_mode(mut self, mode: CitationMode) -> Self {
        self.citation_mode = Some(mode);
        self
    }

    pub fn search_focus(mut self, focus: SearchFocus) -> Self {
        self.search_focus = Some(focus);
        self
    }

    pub fn sources(mut self, sources: Vec<SourceFocus>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn save_to_library(mut self, save: bool) -> Self {
        self.save_to_library = Some(save);
        self
    }

    /// Attach a local file, in addition to any attachments already in
    /// the effective options.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.extra_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.extra_files
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Merge defaults and overrides into the effective options and run
    /// every local check.
    fn resolve_options(&self) -> Result<AskOptions> {
        let mut options = self
            .replace_options
            .clone()
            .or_else(|| {
                self.conversation
                    .as_ref()
                    .and_then(|c| c.defaults().cloned())
            })
            .unwrap_or_else(|| self.client_defaults.clone());

        if let Some(model) = self.model {
            options.model = model;
        }
        if let Some(mode) = self.citation_mode {
            options.citation_mode = mode;
        }
        if let Some(focus) = self.search_focus {
            options.search_focus = focus;
        }
        if let Some(sources) = &self.sources {
            options.sources = sources.clone();
        }
        if let Some(range) = self.time_range {
            options.time_range = range;
        }
        if let Some(language) = &self.language {
            options.language = language.clone();
        }
        if let Some(timezone) = &self.timezone {
            options.timezone = Some(timezone.clone());
        }
        if let Some(coordinates) = self.coordinates {
            options.coordinates = Some(coordinates);
        }
        if let Some(save) = self.save_to_library {
            options.save_to_library = save;
        }
        options.attachments.extend(self.extra_files.iter().cloned());

        options.validate()?;
        Ok(options)
    }

    /// Open the SSE exchange and return its chunk stream.
    pub async fn send_stream(self) -> Result<ResponseStream> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(Error::Config("query must not be empty".into()));
        }
        let options = self.resolve_options()?;

        let mut attachment_urls = Vec::with_capacity(options.attachments.len());
        for path in &options.attachments {
            attachment_urls.push(self.transport.upload(path).await?);
        }

        let last_backend_uuid = self.conversation.as_ref().and_then(|c| c.backend_uuid());
        let follow_up = last_backend_uuid.is_some();
        let payload = build_ask_payload(&query, &options, attachment_urls, last_backend_uuid);

        debug!(
            model = payload.params.model_preference,
            follow_up,
            attachments = payload.params.attachments.len(),
            "sending ask"
        );
        let updates = self.transport.ask(&payload).await?;
        Ok(ResponseStream::new(
            updates,
            options.citation_mode,
            self.conversation,
        ))
    }

    /// Run the exchange to completion and return the final answer.
    pub async fn send(self) -> Result<Response> {
        self.send_stream().await?.collect().await
    }
}
