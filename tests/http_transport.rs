//! HTTP transport tests against a local mock server.

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use perplexity_webui::{CitationMode, Error, PerplexityClient};

fn sse_body(frames: &[serde_json::Value]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {frame}\n\n"))
        .collect()
}

fn answer_frame(answer: &str, chunks: &[&str], is_final: bool) -> serde_json::Value {
    let text = json!({
        "answer": answer,
        "chunks": chunks,
        "web_results": [{"name": "Example", "url": "https://example.com"}],
    });
    json!({
        "backend_uuid": "backend-1",
        "thread_title": "Thread",
        "text": text.to_string(),
        "final": is_final,
    })
}

async fn mount_warmup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> PerplexityClient {
    PerplexityClient::builder()
        .session_token("test-token")
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn ask_streams_sse_frames_with_session_cookie() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    let body = sse_body(&[
        answer_frame("Blue", &["Blue"], false),
        answer_frame("Blue sky.", &["Blue", " sky."], true),
    ]);
    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .and(header(
            "cookie",
            "__Secure-next-auth.session-token=test-token",
        ))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut stream = client
        .ask("why is the sky blue")
        .citation_mode(CitationMode::Default)
        .send_stream()
        .await
        .unwrap();

    let mut answers = Vec::new();
    while let Some(chunk) = stream.next().await {
        answers.push(chunk.unwrap().answer);
    }
    assert_eq!(answers, vec!["Blue", "Blue sky."]);
}

#[tokio::test]
async fn blocking_ask_returns_final_answer_and_metadata() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    let body = sse_body(&[
        answer_frame("Partial", &["Partial"], false),
        answer_frame("Partial answer.", &["Partial", " answer."], true),
    ]);
    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .ask("question")
        .citation_mode(CitationMode::Default)
        .send()
        .await
        .unwrap();

    assert_eq!(response.answer, "Partial answer.");
    assert_eq!(response.title.as_deref(), Some("Thread"));
    assert_eq!(response.conversation_uuid.as_deref(), Some("backend-1"));
    assert_eq!(response.chunks, vec!["Partial", " answer."]);
    assert_eq!(
        response.citations[0].url.as_deref(),
        Some("https://example.com")
    );
}

#[tokio::test]
async fn forbidden_status_is_an_authentication_error() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).ask("question").send().await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
}

#[tokio::test]
async fn server_error_is_an_api_error() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .mount(&server)
        .await;

    match client_for(&server).ask("question").send().await.unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream broke");
        }
        other => panic!("Expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_frame_is_a_protocol_error() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: not json\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).ask("question").send().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn slow_response_hits_the_configured_timeout() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = PerplexityClient::builder()
        .session_token("test-token")
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.ask("question").send().await.unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");
}

#[tokio::test]
async fn attachment_upload_flows_through_the_presigned_target() {
    let server = MockServer::start().await;
    mount_warmup(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/uploads/create_upload_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "s3_bucket_url": format!("{}/bucket", server.uri()),
            "fields": {
                "key": "uploads/${filename}",
                "policy": "signed-policy",
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bucket"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ask_body = sse_body(&[answer_frame("Summarized.", &["Summarized."], true)]);
    Mock::given(method("POST"))
        .and(path("/rest/sse/perplexity_ask"))
        .and(wiremock::matchers::body_string_contains("uploads/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ask_body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, "attachment body").unwrap();

    let response = client_for(&server)
        .ask("summarize the attachment")
        .file(&file_path)
        .send()
        .await
        .unwrap();
    assert_eq!(response.answer, "Summarized.");
}
