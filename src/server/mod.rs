//! JSON-lines question/answer boundary
//!
//! Each input line is a request object `{"question": "..."}`. Each reply is
//! written as a single line, either `{"answer": "..."}` or
//! `{"error": "...", "reason": "...", "status": 400}`.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::RagError;
use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Answer {
        answer: String,
    },
    Error {
        error: String,
        reason: String,
        status: u16,
    },
}

impl From<&RagError> for Reply {
    #[inline]
    fn from(error: &RagError) -> Self {
        Self::Error {
            error: error.to_string(),
            reason: error.reason().to_string(),
            status: error.status_code(),
        }
    }
}

/// Parse one request line and produce its reply
#[inline]
pub async fn handle_line(orchestrator: &Orchestrator, line: &str) -> Reply {
    let request: QuestionRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed request: {}", e);
            return Reply::from(&RagError::InvalidInput(format!(
                "request must be a JSON object with a string \"question\" field: {}",
                e
            )));
        }
    };

    match orchestrator.answer(&request.question).await {
        Ok(answer) => Reply::Answer { answer },
        Err(e) => {
            error!("Request failed ({}): {}", e.reason(), e);
            Reply::from(&e)
        }
    }
}

/// Serve requests from `reader` until EOF, writing one reply line per request
#[inline]
pub async fn serve<R, W>(orchestrator: &Orchestrator, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("Received request ({} bytes)", line.len());
        let reply = handle_line(orchestrator, line).await;

        let mut encoded = serde_json::to_string(&reply).context("Failed to encode reply")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write reply")?;
        writer.flush().await.context("Failed to flush reply")?;
    }

    info!("EOF reached, closing connection");
    Ok(())
}

#[inline]
pub async fn serve_stdio(orchestrator: &Orchestrator) -> Result<()> {
    info!("Serving questions over stdio");
    serve(orchestrator, BufReader::new(io::stdin()), io::stdout()).await
}
