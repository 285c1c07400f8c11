use super::*;
use crate::Result;
use crate::chunking::ChunkingConfig;
use crate::composer::AnswerComposer;
use crate::document::InlineSource;
use crate::embeddings::Embedder;
use crate::index::EmbeddingVector;
use std::sync::Arc;

struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        Ok(if text.contains("Rust") {
            vec![1.0, 0.0]
        } else {
            vec![0.2, 1.0]
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

struct EchoComposer;

impl AnswerComposer for EchoComposer {
    fn complete(&self, _system_directive: &str, context: &str, _question: &str) -> Result<String> {
        Ok(context.lines().next().unwrap_or_default().to_string())
    }
}

fn orchestrator(text: &str) -> Orchestrator {
    Orchestrator::new(
        Arc::new(InlineSource::new("resume", text)),
        Arc::new(AxisEmbedder),
        Arc::new(EchoComposer),
    )
    .with_chunking(ChunkingConfig {
        chunk_size: 40,
        overlap: 0,
    })
    .with_top_k(1)
}

const RESUME: &str = "Writes Rust services since 2015.\n\nEnjoys hiking on weekends.";

#[tokio::test]
async fn answer_reply() {
    let orchestrator = orchestrator(RESUME);

    let reply = handle_line(&orchestrator, r#"{"question": "Does she know Rust?"}"#).await;
    assert_eq!(
        reply,
        Reply::Answer {
            answer: "Writes Rust services since 2015.".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_line_is_invalid_input() {
    let orchestrator = orchestrator(RESUME);

    for line in ["not json", r#"{"query": "x"}"#, r#"{"question": 5}"#, "[]"] {
        match handle_line(&orchestrator, line).await {
            Reply::Error { reason, status, .. } => {
                assert_eq!(reason, "invalid_input");
                assert_eq!(status, 400);
            }
            other => panic!("expected error reply for {}, got {:?}", line, other),
        }
    }
    assert_eq!(orchestrator.build_count(), 0);
}

#[tokio::test]
async fn empty_question_is_invalid_input() {
    let orchestrator = orchestrator(RESUME);

    let reply = handle_line(&orchestrator, r#"{"question": "   "}"#).await;
    assert!(matches!(reply, Reply::Error { status: 400, .. }));
}

#[tokio::test]
async fn build_failure_reply_has_no_answer() {
    let orchestrator = orchestrator("");

    let reply = handle_line(&orchestrator, r#"{"question": "Anything?"}"#).await;
    let encoded = serde_json::to_value(&reply).expect("reply should serialize");

    assert!(encoded.get("answer").is_none());
    assert_eq!(encoded["reason"], "invalid_input");
    assert_eq!(encoded["status"], 400);
}

#[tokio::test]
async fn serve_writes_one_reply_per_request() {
    let orchestrator = orchestrator(RESUME);
    let input = concat!(
        "{\"question\": \"Rust?\"}\n",
        "\n",
        "garbage\n",
        "{\"question\": \"Hobbies?\"}\n",
    );
    let mut output = Vec::new();

    serve(&orchestrator, input.as_bytes(), &mut output)
        .await
        .expect("serve should succeed");

    let text = String::from_utf8(output).expect("output should be utf-8");
    let replies: Vec<Reply> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("reply should parse"))
        .collect();

    assert_eq!(replies.len(), 3);
    assert_eq!(
        replies[0],
        Reply::Answer {
            answer: "Writes Rust services since 2015.".to_string()
        }
    );
    assert!(matches!(replies[1], Reply::Error { status: 400, .. }));
    assert_eq!(
        replies[2],
        Reply::Answer {
            answer: "Enjoys hiking on weekends.".to_string()
        }
    );
    assert_eq!(orchestrator.build_count(), 1);
}

#[test]
fn error_reply_shape() {
    let reply = Reply::from(&RagError::Upstream("rate limited".to_string()));
    let encoded = serde_json::to_value(&reply).expect("reply should serialize");

    assert_eq!(encoded["error"], "Upstream error: rate limited");
    assert_eq!(encoded["reason"], "upstream_failure");
    assert_eq!(encoded["status"], 502);
}
