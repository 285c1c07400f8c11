#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests against a mocked Ollama server

use resume_qa::config::Config;
use resume_qa::orchestrator::{IndexState, Orchestrator};
use resume_qa::server::{Reply, handle_line};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const RESUME: &str = "Jane Doe\nSenior engineer.\n\nSkills: Rust, Go and SQL.\n\nHobbies: hiking and chess.";

/// Embeds by keyword so retrieval results are predictable
struct KeywordEmbeddings;

fn keyword_vector(text: &str) -> Vec<f32> {
    if text.contains("Rust") {
        vec![1.0, 0.0, 0.0]
    } else if text.contains("hiking") || text.contains("hobbies") {
        vec![0.0, 1.0, 0.0]
    } else {
        vec![0.0, 0.0, 1.0]
    }
}

impl Respond for KeywordEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or(Value::Null);
        let embeddings: Vec<Vec<f32>> = match &body["input"] {
            Value::String(text) => vec![keyword_vector(text)],
            Value::Array(texts) => texts
                .iter()
                .map(|t| keyword_vector(t.as_str().unwrap_or_default()))
                .collect(),
            _ => return ResponseTemplate::new(400),
        };
        ResponseTemplate::new(200).set_body_json(json!({ "embeddings": embeddings }))
    }
}

async fn mock_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(KeywordEmbeddings)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "Jane writes Rust, Go and SQL."},
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

fn write_config(dir: &TempDir, server: &MockServer, with_document: bool) -> Config {
    let address = server.address();
    let config = format!(
        r#"
            [ollama]
            host = "{}"
            port = {}
            embedding_model = "test-embed"
            chat_model = "test-chat"

            [chunking]
            chunk_size = 50
            overlap = 0

            [retrieval]
            top_k = 1

            [answer]
            subject = "Jane Doe"
        "#,
        address.ip(),
        address.port()
    );
    fs::write(dir.path().join("config.toml"), config).expect("should write config");
    if with_document {
        fs::write(dir.path().join("resume.txt"), RESUME).expect("should write resume");
    }

    Config::load(dir.path()).expect("config should load")
}

async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .map(|r| r.body_json().expect("request body should be json"))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn answers_from_retrieved_context() {
    let server = mock_ollama().await;
    let dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&dir, &server, true);

    let orchestrator = Orchestrator::from_config(&config).expect("orchestrator should build");
    let answer = orchestrator
        .answer("Does Jane know Rust?")
        .await
        .expect("answer should succeed");
    assert_eq!(answer, "Jane writes Rust, Go and SQL.");

    let chats = requests_to(&server, "/api/chat").await;
    assert_eq!(chats.len(), 1);
    let system = chats[0]["messages"][0]["content"]
        .as_str()
        .expect("system message should be a string");
    assert!(system.starts_with("You are Jane Doe's professional AI agent."));
    assert!(system.ends_with("Context:\nSkills: Rust, Go and SQL."));
    assert_eq!(chats[0]["messages"][1]["content"], "Does Jane know Rust?");
    assert_eq!(chats[0]["model"], "test-chat");
}

#[tokio::test(flavor = "multi_thread")]
async fn document_embedded_once_across_requests() {
    let server = mock_ollama().await;
    let dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&dir, &server, true);

    let orchestrator = Arc::new(Orchestrator::from_config(&config).expect("orchestrator should build"));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.answer("What are the hobbies?").await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result
            .expect("task should join")
            .expect("answer should succeed");
    }

    let batch_requests: Vec<Value> = requests_to(&server, "/api/embed")
        .await
        .into_iter()
        .filter(|body| body["input"].is_array())
        .collect();
    assert_eq!(batch_requests.len(), 1);
    assert_eq!(batch_requests[0]["input"].as_array().map(Vec::len), Some(3));
    assert_eq!(orchestrator.build_count(), 1);
    assert_eq!(orchestrator.state(), IndexState::Ready);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_document_fails_every_request() {
    let server = mock_ollama().await;
    let dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&dir, &server, false);

    let orchestrator = Orchestrator::from_config(&config).expect("orchestrator should build");
    let error = orchestrator
        .warm_up()
        .await
        .expect_err("warm up should fail without a document");
    assert_eq!(error.reason(), "configuration_error");

    let reply = handle_line(&orchestrator, r#"{"question": "Does Jane know Rust?"}"#).await;
    assert!(matches!(reply, Reply::Error { status: 500, .. }));
    assert!(requests_to(&server, "/api/chat").await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn upstream_failure_reported_at_boundary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&dir, &server, true);
    let orchestrator = Orchestrator::from_config(&config).expect("orchestrator should build");

    let reply = handle_line(&orchestrator, r#"{"question": "Does Jane know Rust?"}"#).await;
    match reply {
        Reply::Error { reason, status, .. } => {
            assert_eq!(reason, "upstream_failure");
            assert_eq!(status, 502);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert_eq!(orchestrator.state(), IndexState::Uninitialized);
}
