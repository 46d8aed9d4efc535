//! Contract tests for the ask API against a scripted in-memory transport.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use perplexity_webui::models::request::AskPayload;
use perplexity_webui::{
    AnswerState, AskOptions, CitationMode, Error, Model, PerplexityClient, Result, SearchResult,
    StreamUpdate, Transport, UpdateStream,
};

/// Scripted transport: each `ask` pops the next exchange outcome; every
/// call and the last payload are recorded for assertions.
#[derive(Default)]
struct MockTransport {
    exchanges: Mutex<VecDeque<std::result::Result<Vec<StreamUpdate>, Error>>>,
    last_payload: Mutex<Option<AskPayload>>,
    ask_calls: AtomicUsize,
    upload_calls: AtomicUsize,
}

impl MockTransport {
    fn scripted(exchanges: Vec<std::result::Result<Vec<StreamUpdate>, Error>>) -> Arc<Self> {
        Arc::new(Self {
            exchanges: Mutex::new(exchanges.into()),
            ..Self::default()
        })
    }

    fn last_payload(&self) -> AskPayload {
        self.last_payload
            .lock()
            .unwrap()
            .clone()
            .expect("no ask was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn ask(&self, payload: &AskPayload) -> Result<UpdateStream> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());

        let updates = self
            .exchanges
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted ask")?;
        Ok(Box::pin(futures::stream::iter(updates.into_iter().map(Ok))))
    }

    async fn upload(&self, path: &Path) -> Result<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://uploads.test/{}",
            path.file_name().unwrap().to_str().unwrap()
        ))
    }
}

fn client_with(transport: Arc<MockTransport>) -> PerplexityClient {
    PerplexityClient::builder()
        .transport(transport)
        .build()
        .unwrap()
}

fn update(answer: &str, chunks: &[&str], citations: &[&str], is_final: bool) -> StreamUpdate {
    StreamUpdate {
        backend_uuid: Some("backend-uuid-1".into()),
        thread_title: Some("Test thread".into()),
        is_final,
        answer: Some(AnswerState {
            answer: answer.to_string(),
            chunks: chunks.iter().map(|s| s.to_string()).collect(),
            web_results: citations
                .iter()
                .map(|url| SearchResult {
                    title: Some("Source".into()),
                    snippet: None,
                    url: Some(url.to_string()),
                })
                .collect(),
        }),
        raw: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn validation_failure_makes_no_transport_calls() {
    let transport = MockTransport::scripted(vec![]);
    let client = client_with(Arc::clone(&transport));

    let err = client
        .ask("hello")
        .language("not a locale")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = client.ask("   ").send().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = client
        .ask("hello")
        .file("/nonexistent/missing.pdf")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    assert_eq!(transport.ask_calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.upload_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn streaming_yields_chunks_in_order_with_final_last() {
    let transport = MockTransport::scripted(vec![Ok(vec![
        update("One", &["One"], &[], false),
        update("One two", &["One", " two"], &[], false),
        update("One two three.", &["One", " two", " three."], &[], true),
    ])]);
    let client = client_with(Arc::clone(&transport));

    let mut stream = client.ask("count to three").send_stream().await.unwrap();
    let mut answers = Vec::new();
    let mut finals = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        answers.push(chunk.answer);
        finals.push(chunk.is_final);
    }

    assert_eq!(answers, vec!["One", "One two", "One two three."]);
    assert_eq!(finals, vec![false, false, true]);
    assert_eq!(transport.ask_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_is_single_pass() {
    let transport = MockTransport::scripted(vec![Ok(vec![update("Hi.", &["Hi."], &[], true)])]);
    let client = client_with(transport);

    let mut stream = client.ask("hi").send_stream().await.unwrap();
    while stream.next().await.is_some() {}

    match stream.next().await {
        Some(Err(Error::Usage(_))) => {}
        other => panic!("Expected usage error on second pass, got {other:?}"),
    }
}

#[tokio::test]
async fn auth_rejection_propagates_without_retry() {
    let transport = MockTransport::scripted(vec![Err(Error::Authentication(
        "upstream returned 403".into(),
    ))]);
    let client = client_with(Arc::clone(&transport));

    let err = client.ask("hello").send().await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(transport.ask_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn short_numeric_answer_survives_clean_mode() {
    // "4." must not be mangled by citation processing.
    let transport = MockTransport::scripted(vec![Ok(vec![update(
        "4.",
        &["4."],
        &["https://example.com"],
        true,
    )])]);
    let client = client_with(transport);

    let response = client
        .ask("what is 2+2")
        .citation_mode(CitationMode::Clean)
        .send()
        .await
        .unwrap();
    assert_eq!(response.answer, "4.");
}

#[tokio::test]
async fn markdown_mode_links_markers_in_final_answer() {
    let transport = MockTransport::scripted(vec![Ok(vec![update(
        "The sky is blue[1].",
        &["The sky is blue[1]."],
        &["https://example.com"],
        true,
    )])]);
    let client = client_with(transport);

    let response = client
        .ask("why is the sky blue")
        .citation_mode(CitationMode::Markdown)
        .send()
        .await
        .unwrap();
    assert_eq!(response.answer, "The sky is blue[1](https://example.com).");
    assert_eq!(response.citations.len(), 1);
}

#[tokio::test]
async fn blocking_and_streaming_agree_on_the_final_answer() {
    let exchange = vec![
        update("Blue[1]", &["Blue[1]"], &["https://example.com"], false),
        update(
            "Blue[1] sky.",
            &["Blue[1]", " sky."],
            &["https://example.com"],
            true,
        ),
    ];
    let transport = MockTransport::scripted(vec![Ok(exchange.clone()), Ok(exchange)]);
    let client = client_with(transport);

    let blocking = client
        .ask("q")
        .citation_mode(CitationMode::Markdown)
        .send()
        .await
        .unwrap();

    let mut stream = client
        .ask("q")
        .citation_mode(CitationMode::Markdown)
        .send_stream()
        .await
        .unwrap();
    let mut last = None;
    while let Some(chunk) = stream.next().await {
        last = Some(chunk.unwrap());
    }
    let last = last.unwrap();

    assert!(last.is_final);
    assert_eq!(blocking.answer, last.answer);
    assert_eq!(blocking.citations, last.citations);
}

#[tokio::test]
async fn conversation_follow_up_references_the_thread() {
    let transport = MockTransport::scripted(vec![
        Ok(vec![update("First.", &["First."], &[], true)]),
        Ok(vec![update("Second.", &["Second."], &[], true)]),
    ]);
    let client = client_with(Arc::clone(&transport));
    let conversation = client.create_conversation();

    client
        .ask("first question")
        .conversation(&conversation)
        .send()
        .await
        .unwrap();
    assert!(transport.last_payload().params.last_backend_uuid.is_none());
    assert_eq!(conversation.backend_uuid().as_deref(), Some("backend-uuid-1"));

    client
        .ask("follow up")
        .conversation(&conversation)
        .send()
        .await
        .unwrap();
    assert_eq!(
        transport.last_payload().params.last_backend_uuid.as_deref(),
        Some("backend-uuid-1")
    );
}

#[tokio::test]
async fn per_call_overrides_beat_client_defaults() {
    let transport = MockTransport::scripted(vec![Ok(vec![update("Ok.", &["Ok."], &[], true)])]);
    let client = PerplexityClient::builder()
        .transport(Arc::clone(&transport) as Arc<dyn Transport>)
        .default_options(
            AskOptions::builder()
                .model(Model::Best)
                .language("de")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    client
        .ask("q")
        .model(Model::Grok4)
        .send()
        .await
        .unwrap();

    let payload = transport.last_payload();
    assert_eq!(payload.params.model_preference, "grok4");
    // Untouched defaults carry through.
    assert_eq!(payload.params.language, "de");
}

#[tokio::test]
async fn attachments_upload_before_the_ask() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    let transport = MockTransport::scripted(vec![Ok(vec![update("Ok.", &["Ok."], &[], true)])]);
    let client = client_with(Arc::clone(&transport));

    client.ask("summarize this").file(&path).send().await.unwrap();

    assert_eq!(transport.upload_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        transport.last_payload().params.attachments,
        vec!["https://uploads.test/notes.txt"]
    );
}

#[tokio::test]
async fn incognito_follows_save_to_library() {
    let transport = MockTransport::scripted(vec![
        Ok(vec![update("Ok.", &["Ok."], &[], true)]),
        Ok(vec![update("Ok.", &["Ok."], &[], true)]),
    ]);
    let client = client_with(Arc::clone(&transport));

    client.ask("q").send().await.unwrap();
    assert!(transport.last_payload().params.is_incognito);

    client.ask("q").save_to_library(true).send().await.unwrap();
    assert!(!transport.last_payload().params.is_incognito);
}
